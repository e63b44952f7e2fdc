//! Peer registry & discovery (spec.md §4.4).
//!
//! Mirrors the teacher's `DiscoveredPeers` (`Arc<RwLock<HashMap<...>>>`,
//! upsert-on-beacon, prune-on-sweep) generalized from a JSON beacon keyed by
//! string device id to a binary OptIn keyed by the protocol's `u16` node id.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use crate::protocol::header::Header;
use crate::protocol::{NodeType, OptIn};

/// Owned, internal record of a live peer.
#[derive(Debug, Clone)]
struct PeerEntry {
    node_id: u16,
    node_name: String,
    node_type: NodeType,
    vendor_name: String,
    app_name: String,
    listener_port: u16,
    remote_ip: IpAddr,
    major: u8,
    minor: u8,
    bug: u8,
    /// The peer's self-reported uptime (seconds) as of its most recent OptIn.
    uptime: u16,
    last_seen: Instant,
}

impl PeerEntry {
    fn to_info(&self) -> PeerInfo {
        PeerInfo {
            node_id: self.node_id,
            node_name: self.node_name.clone(),
            node_type: self.node_type,
            vendor_name: self.vendor_name.clone(),
            app_name: self.app_name.clone(),
            unicast_addr: SocketAddr::new(self.remote_ip, self.listener_port),
            protocol_version: (self.major, self.minor, self.bug),
            uptime: self.uptime,
        }
    }
}

/// Public, caller-facing snapshot of a peer. Not retained by the registry —
/// every method that hands one out copies it from the live entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub node_id: u16,
    pub node_name: String,
    pub node_type: NodeType,
    pub vendor_name: String,
    pub app_name: String,
    pub unicast_addr: SocketAddr,
    pub protocol_version: (u8, u8, u8),
    /// The peer's self-reported uptime (seconds) as of its most recent OptIn.
    pub uptime: u16,
}

/// The shared peer map plus the bookkeeping spec.md §4.4 describes:
/// upsert/refresh on receipt, immediate removal on OptOut, and periodic
/// idle eviction.
pub struct PeerRegistry {
    peers: RwLock<HashMap<u16, PeerEntry>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or refreshes a peer from a decoded OptIn. Returns `Some` with
    /// the new `PeerInfo` only when the node id was not previously known —
    /// the caller uses this to decide whether to emit `Event::PeerAdded`
    /// (spec.md §4.4's "upsert on OptIn" plus "emit an event after a
    /// meaningful map change" rule).
    pub fn upsert(&self, header: &Header, opt_in: &OptIn, remote_ip: IpAddr) -> Option<PeerInfo> {
        let mut guard = self.peers.write();
        let is_new = !guard.contains_key(&header.node_id);
        let entry = PeerEntry {
            node_id: header.node_id,
            node_name: header.node_name.clone(),
            node_type: header.node_type,
            vendor_name: opt_in.vendor_name.clone(),
            app_name: opt_in.app_name.clone(),
            listener_port: opt_in.listener_port,
            remote_ip,
            major: opt_in.major,
            minor: opt_in.minor,
            bug: opt_in.bug,
            uptime: opt_in.uptime,
            last_seen: Instant::now(),
        };
        let info = entry.to_info();
        guard.insert(header.node_id, entry);
        is_new.then_some(info)
    }

    /// Refreshes `last_seen` for a known peer. A no-op for unknown node ids
    /// (a datagram from a node we haven't seen an OptIn for yet).
    pub fn touch(&self, node_id: u16) {
        if let Some(entry) = self.peers.write().get_mut(&node_id) {
            entry.last_seen = Instant::now();
        }
    }

    /// Removes a peer immediately (OptOut). Returns its node id if it was
    /// present, so the caller knows whether to cancel pending requests and
    /// emit `Event::PeerRemoved`.
    pub fn remove(&self, node_id: u16) -> Option<u16> {
        self.peers.write().remove(&node_id).map(|_| node_id)
    }

    /// Snapshot of every live peer, for `TcNetClient::peers()`.
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        self.peers.read().values().map(PeerEntry::to_info).collect()
    }

    /// Looks up a single peer's unicast destination by node id.
    pub fn get(&self, node_id: u16) -> Option<PeerInfo> {
        self.peers.read().get(&node_id).map(PeerEntry::to_info)
    }

    /// The client façade's default peer: the first `Master`, falling back
    /// to any peer (spec.md §4.6).
    pub fn default_peer(&self) -> Option<PeerInfo> {
        let guard = self.peers.read();
        guard
            .values()
            .find(|p| p.node_type == NodeType::Master)
            .or_else(|| guard.values().next())
            .map(PeerEntry::to_info)
    }

    /// Removes every peer whose `last_seen` is older than `idle_threshold`,
    /// returning the evicted peers' node ids so the caller can cancel their
    /// pending requests and emit `Event::PeerRemoved`.
    pub fn evict_idle(&self, idle_threshold: Duration) -> Vec<u16> {
        let mut guard = self.peers.write();
        let mut evicted = Vec::new();
        guard.retain(|node_id, entry| {
            let alive = entry.last_seen.elapsed() < idle_threshold;
            if !alive {
                evicted.push(*node_id);
            }
            alive
        });
        evicted
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::constants::MAJOR_VERSION;
    use crate::protocol::MessageType;
    use std::net::Ipv4Addr;

    fn header(node_id: u16, node_type: NodeType) -> Header {
        Header {
            node_id,
            major_version: MAJOR_VERSION,
            minor_version: 0,
            message_type: MessageType::OptIn,
            node_name: "rekbox01".into(),
            sequence: 0,
            node_type,
            node_options: 0,
            timestamp: 0,
        }
    }

    fn opt_in(listener_port: u16) -> OptIn {
        OptIn {
            node_count: 1,
            listener_port,
            uptime: 0,
            vendor_name: "Pioneer".into(),
            app_name: "rekordbox".into(),
            major: 3,
            minor: 0,
            bug: 0,
        }
    }

    #[test]
    fn upsert_reports_new_peer_once() {
        let reg = PeerRegistry::new();
        let h = header(7, NodeType::Master);
        let first = reg.upsert(&h, &opt_in(12345), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(first.is_some());
        let second = reg.upsert(&h, &opt_in(12345), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(second.is_none());
        assert_eq!(reg.snapshot().len(), 1);
    }

    #[test]
    fn default_peer_prefers_master() {
        let reg = PeerRegistry::new();
        reg.upsert(
            &header(1, NodeType::Slave),
            &opt_in(1111),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        reg.upsert(
            &header(2, NodeType::Master),
            &opt_in(2222),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        let default = reg.default_peer().unwrap();
        assert_eq!(default.node_id, 2);
    }

    #[test]
    fn evict_idle_removes_stale_peers() {
        let reg = PeerRegistry::new();
        reg.upsert(
            &header(7, NodeType::Master),
            &opt_in(12345),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        let evicted = reg.evict_idle(Duration::from_secs(0));
        assert_eq!(evicted, vec![7]);
        assert!(reg.snapshot().is_empty());
    }

    #[test]
    fn remove_is_none_for_unknown_peer() {
        let reg = PeerRegistry::new();
        assert_eq!(reg.remove(42), None);
    }

    // spec.md §8 scenario 5: "a peer seen once and then silent for
    // 5 × optInInterval disappears." Exercised against Tokio's virtual
    // clock (`start_paused` + `advance`) rather than a real sleep, so the
    // test is instant and deterministic instead of racing a wall-clock
    // threshold.
    #[tokio::test(start_paused = true)]
    async fn idle_peer_survives_up_to_the_threshold() {
        let reg = PeerRegistry::new();
        reg.upsert(
            &header(7, NodeType::Master),
            &opt_in(12345),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        let threshold = Duration::from_millis(5_000);

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(reg.evict_idle(threshold).is_empty());
        assert_eq!(reg.snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_peer_is_evicted_past_the_threshold() {
        let reg = PeerRegistry::new();
        reg.upsert(
            &header(7, NodeType::Master),
            &opt_in(12345),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        let threshold = Duration::from_millis(5_000);

        tokio::time::advance(Duration::from_millis(5_001)).await;
        let evicted = reg.evict_idle(threshold);
        assert_eq!(evicted, vec![7]);
        assert!(reg.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn touch_resets_the_idle_clock() {
        let reg = PeerRegistry::new();
        reg.upsert(
            &header(7, NodeType::Master),
            &opt_in(12345),
            IpAddr::V4(Ipv4Addr::LOCALHOST),
        );
        let threshold = Duration::from_millis(5_000);

        tokio::time::advance(Duration::from_millis(4_000)).await;
        reg.touch(7);
        tokio::time::advance(Duration::from_millis(4_000)).await;
        assert!(
            reg.evict_idle(threshold).is_empty(),
            "touch should have reset last_seen at the 4s mark"
        );
    }
}
