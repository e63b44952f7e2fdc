//! The public event stream (spec.md §4.7).
//!
//! Backed by `tokio::sync::broadcast`, the same primitive and bounded-buffer
//! policy the teacher's peer session uses for `rx_updates`: a slow
//! subscriber falls behind and eventually sees `RecvError::Lagged` rather
//! than blocking the dispatcher.

use crate::peer::PeerInfo;
use crate::protocol::Packet;

/// Default capacity of the broadcast channel backing `TcNetClient::events`.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something the client observed. Subscribers that fall behind the
/// channel's capacity will miss events and should treat a `Lagged` error
/// from `recv()` as "resync from a fresh snapshot," not a fatal condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A packet received on the broadcast socket (OptIn/OptOut/Status/
    /// TimeSync/Time/Data-not-tied-to-a-pending-request).
    Broadcast(Packet),
    /// A packet received on the unicast socket that did not match any
    /// pending request (e.g. arrived after its caller's timeout elapsed).
    UnicastPacket(Packet),
    /// A previously-unseen peer sent an OptIn.
    PeerAdded(PeerInfo),
    /// A peer sent OptOut or was evicted for being idle past the threshold.
    PeerRemoved(u16),
}
