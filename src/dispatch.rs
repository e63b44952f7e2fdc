//! Routes a decoded packet to the pending-request table, the peer registry,
//! or the public event stream. This is the one place that knows how
//! spec.md §4.4, §4.5, and §4.7 compose: a reply satisfies at most one
//! pending request; everything else becomes an `Event`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::correlation::PendingTable;
use crate::error::{RemoteErrorCode, TcNetError};
use crate::event::Event;
use crate::peer::PeerRegistry;
use crate::protocol::{self, MessageType, Packet};
use crate::transport::{Datagram, SocketKind};

/// Derives the `(data_type, layer)` half of a pending-request key from a
/// decoded Data packet. Mixer state isn't per-layer, so it keys on a fixed
/// sentinel layer of `0`.
fn data_key(packet: &Packet) -> Option<(u8, u8)> {
    use crate::protocol::constants::DataSubType;
    match packet {
        Packet::Metrics(m) => Some((DataSubType::Metrics.into(), m.layer_id)),
        Packet::Metadata(m) => Some((DataSubType::Metadata.into(), m.layer_id)),
        Packet::Cue(c) => Some((DataSubType::Cue.into(), c.layer_id)),
        Packet::Waveform(w) => Some((w.sub_type, w.layer_id)),
        Packet::Mixer(_) => Some((DataSubType::Mixer.into(), 0)),
        _ => None,
    }
}

pub struct Dispatcher {
    peers: Arc<PeerRegistry>,
    pending: Arc<PendingTable>,
    events: broadcast::Sender<Event>,
}

impl Dispatcher {
    pub fn new(
        peers: Arc<PeerRegistry>,
        pending: Arc<PendingTable>,
        events: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            peers,
            pending,
            events,
        }
    }

    fn emit(&self, event: Event) {
        // `send` only errors when there are no subscribers; that's fine,
        // the client simply has no one listening right now.
        let _ = self.events.send(event);
    }

    pub fn handle_datagram(&self, datagram: Datagram) {
        let Datagram { src, bytes, kind } = datagram;
        match protocol::decode(&bytes) {
            Ok((header, packet)) => self.handle_packet(src, kind, header, packet),
            Err(e) => {
                log::warn!("dispatch: dropping undecodable datagram from {src}: {e}");
            }
        }
    }

    fn handle_packet(
        &self,
        src: SocketAddr,
        kind: SocketKind,
        header: protocol::Header,
        packet: Packet,
    ) {
        self.peers.touch(header.node_id);

        match &packet {
            Packet::OptIn(opt_in) => {
                if let Some(info) = self.peers.upsert(&header, opt_in, src.ip()) {
                    self.emit(Event::PeerAdded(info));
                }
                return;
            }
            Packet::OptOut(_) => {
                if self.peers.remove(header.node_id).is_some() {
                    self.pending
                        .cancel_for_peer(header.node_id, TcNetError::PeerGone { node_id: header.node_id });
                    self.emit(Event::PeerRemoved(header.node_id));
                }
                return;
            }
            Packet::Error(err) => {
                let key = (header.node_id, err.data_type, err.layer_id);
                let code = RemoteErrorCode::from(err.code);
                if code.code() == crate::protocol::constants::error_code::REQUEST_RESPONSE_OK {
                    return;
                }
                let result = Err(TcNetError::Remote {
                    node_id: header.node_id,
                    data_type: err.data_type,
                    layer: err.layer_id,
                    code,
                });
                if !self.pending.deliver(key, result, true) {
                    self.emit_by_kind(kind, packet);
                }
                return;
            }
            _ => {}
        }

        if let Some((data_type, layer)) = data_key(&packet) {
            let key = (header.node_id, data_type, layer);
            let is_waveform = matches!(packet, Packet::Waveform(_));
            let consumed = self
                .pending
                .deliver(key, Ok(packet.clone()), !is_waveform);
            if !consumed {
                self.emit_by_kind(kind, packet);
            }
            return;
        }

        if matches!(header.message_type, MessageType::Request) {
            // Serving peer-originated requests (acting as a TCNet data
            // source ourselves) is out of scope; observe and move on.
            log::debug!("dispatch: ignoring inbound Request from node {}", header.node_id);
            return;
        }

        self.emit_by_kind(kind, packet);
    }

    fn emit_by_kind(&self, kind: SocketKind, packet: Packet) {
        match kind {
            SocketKind::Broadcast => self.emit(Event::Broadcast(packet)),
            SocketKind::Unicast => self.emit(Event::UnicastPacket(packet)),
        }
    }
}
