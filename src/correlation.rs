//! Request/response correlation (spec.md §4.5).
//!
//! A pending entry is keyed by `(peer_node_id, data_type, layer)`. At most
//! one entry exists per key; a second caller for the same key coalesces onto
//! the existing entry rather than sending a second datagram — both the
//! original caller and the coalesced one observe the same delivered result,
//! via `tokio::sync::broadcast` (so "both complete with the same result" is
//! the channel's native multi-subscriber behaviour, not something this table
//! has to fan out itself).
//!
//! The table holds no timers and spawns no tasks of its own: the deadline is
//! enforced by the caller wrapping its receive in `tokio::time::timeout`,
//! matching spec.md §5's model where "awaiting a deadline timer" is a
//! property of the call, not the engine.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::TcNetError;
use crate::protocol::Packet;

/// `(peer_node_id, data_type, layer)`. Mixer requests use `layer = 0` since
/// mixer state is not per-layer.
pub type PendingKey = (u16, u8, u8);

type Delivered = Result<Packet, TcNetError>;

struct PendingEntry {
    tx: broadcast::Sender<Delivered>,
}

/// Shared table of in-flight requests.
pub struct PendingTable {
    inner: Mutex<HashMap<PendingKey, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Registers interest in `key`, returning a receiver plus whether this
    /// caller is the "owner" — the one responsible for actually sending the
    /// Request datagram. A coalesced (non-owner) caller must not re-send.
    pub fn register(&self, key: PendingKey) -> (broadcast::Receiver<Delivered>, bool) {
        let mut guard = self.inner.lock();
        if let Some(entry) = guard.get(&key) {
            (entry.tx.subscribe(), false)
        } else {
            let (tx, rx) = broadcast::channel(8);
            guard.insert(key, PendingEntry { tx });
            (rx, true)
        }
    }

    /// Delivers `result` to every subscriber of `key`. When `remove` is
    /// true the entry is dropped from the table first — used for every
    /// reply type except waveform fragments, where the caller keeps the
    /// entry alive across multiple deliveries and removes it itself once
    /// assembly finishes or the deadline passes.
    ///
    /// Returns `true` if a pending entry existed for `key` (i.e. the packet
    /// was consumed by a waiter rather than left for the event stream).
    pub fn deliver(&self, key: PendingKey, result: Delivered, remove: bool) -> bool {
        let mut guard = self.inner.lock();
        if remove {
            if let Some(entry) = guard.remove(&key) {
                let _ = entry.tx.send(result);
                return true;
            }
            false
        } else if let Some(entry) = guard.get(&key) {
            let _ = entry.tx.send(result);
            true
        } else {
            false
        }
    }

    /// Drops the entry for `key` without sending anything further. Used by
    /// callers after a successful waveform assembly or a client-side
    /// timeout, where the table itself doesn't know the exchange is done.
    pub fn remove(&self, key: PendingKey) {
        self.inner.lock().remove(&key);
    }

    /// Cancels every pending entry addressed to `node_id`, completing each
    /// with `err` (normally `TcNetError::PeerGone`). Called on OptOut and on
    /// idle eviction.
    pub fn cancel_for_peer(&self, node_id: u16, err: TcNetError) {
        let mut guard = self.inner.lock();
        let keys: Vec<PendingKey> = guard
            .keys()
            .copied()
            .filter(|(peer, _, _)| *peer == node_id)
            .collect();
        for key in keys {
            if let Some(entry) = guard.remove(&key) {
                let _ = entry.tx.send(Err(err.clone()));
            }
        }
    }

    /// Completes every outstanding entry with `TcNetError::Shutdown`. Called
    /// from `TcNetClient::disconnect`.
    pub fn shutdown(&self) {
        let mut guard = self.inner.lock();
        for (_, entry) in guard.drain() {
            let _ = entry.tx.send(Err(TcNetError::Shutdown));
        }
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_metrics() -> Packet {
        Packet::Metrics(crate::protocol::data::Metrics {
            layer_id: 2,
            state: 0,
            sync_master: 0,
            beat_marker: 0,
            track_length_ms: 0,
            current_position_ms: 0,
            speed: 0,
            beat_number: 0,
            bpm_x100: 0,
            pitch_bend: 0,
            track_id: 0,
        })
    }

    #[tokio::test]
    async fn second_registration_coalesces() {
        let table = PendingTable::new();
        let key = (7u16, 2u8, 2u8);
        let (mut rx_a, owner_a) = table.register(key);
        let (mut rx_b, owner_b) = table.register(key);
        assert!(owner_a);
        assert!(!owner_b);

        assert!(table.deliver(key, Ok(dummy_metrics()), true));

        assert!(rx_a.recv().await.unwrap().is_ok());
        assert!(rx_b.recv().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn deliver_with_no_entry_returns_false() {
        let table = PendingTable::new();
        assert!(!table.deliver((1, 2, 3), Ok(dummy_metrics()), true));
    }

    #[tokio::test]
    async fn cancel_for_peer_completes_with_given_error() {
        let table = PendingTable::new();
        let key = (9u16, 4u8, 1u8);
        let (mut rx, _owner) = table.register(key);
        table.cancel_for_peer(9, TcNetError::PeerGone { node_id: 9 });
        match rx.recv().await.unwrap() {
            Err(TcNetError::PeerGone { node_id }) => assert_eq!(node_id, 9),
            other => panic!("expected PeerGone, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn waveform_style_repeated_delivery_without_removal() {
        let table = PendingTable::new();
        let key = (3u16, 16u8, 1u8);
        let (mut rx, owner) = table.register(key);
        assert!(owner);
        assert!(table.deliver(key, Ok(dummy_metrics()), false));
        assert!(table.deliver(key, Ok(dummy_metrics()), false));
        assert!(rx.recv().await.unwrap().is_ok());
        assert!(rx.recv().await.unwrap().is_ok());
        table.remove(key);
        assert!(!table.deliver(key, Ok(dummy_metrics()), false));
    }
}
