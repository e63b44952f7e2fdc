//! Client configuration (spec.md §6).
//!
//! Follows the teacher's `Config`/`Default` pattern: a plain struct with an
//! explicit `Default` impl rather than a builder full of magic numbers.

use crate::protocol::constants::{
    DEFAULT_BROADCAST_PORT, DEFAULT_DISCOVERY_GRACE_MS, DEFAULT_OPTIN_INTERVAL_MS,
    DEFAULT_PEER_IDLE_MULTIPLIER, DEFAULT_REQUEST_TIMEOUT_MS,
};

/// Tunables for a `TcNetClient`. Every field has a default matching
/// spec.md §6's option table.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// UDP port the broadcast socket binds and sends OptIn/OptOut on.
    pub broadcast_port: u16,
    /// Name of the local network interface to bind to, e.g. `"eth0"`. `None`
    /// resolves to the OS default route's interface via `local-ip-address`.
    pub broadcast_interface: Option<String>,
    /// How often this client announces itself with an OptIn.
    pub opt_in_interval_ms: u64,
    /// A peer silent for `opt_in_interval_ms * peer_idle_multiplier` is evicted.
    pub peer_idle_multiplier: u32,
    /// Deadline for `request_data` and the façade methods built on it.
    pub request_timeout_ms: u64,
    /// How long `connect()` waits for the first peer to appear before
    /// returning anyway (spec.md §6's "discovery grace period").
    pub discovery_grace_ms: u64,
    /// Node name advertised in this client's management header (8 bytes,
    /// truncated/padded on encode). Defaults to the local hostname.
    pub node_name: Option<String>,
    /// `vendorName`/`appName` advertised in this client's OptIn.
    pub vendor_name: String,
    pub app_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broadcast_port: DEFAULT_BROADCAST_PORT,
            broadcast_interface: None,
            opt_in_interval_ms: DEFAULT_OPTIN_INTERVAL_MS,
            peer_idle_multiplier: DEFAULT_PEER_IDLE_MULTIPLIER,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            discovery_grace_ms: DEFAULT_DISCOVERY_GRACE_MS,
            node_name: None,
            vendor_name: "rust-tcnet-client".into(),
            app_name: "tcnet-client".into(),
        }
    }
}

impl ClientConfig {
    /// Resolves `node_name`, falling back to the system hostname (truncated
    /// to 8 bytes on encode) when unset.
    pub fn resolved_node_name(&self) -> String {
        self.node_name.clone().unwrap_or_else(|| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "tcnet".to_string())
        })
    }

    pub fn idle_threshold_ms(&self) -> u64 {
        self.opt_in_interval_ms * self.peer_idle_multiplier as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.broadcast_port, 60000);
        assert_eq!(cfg.opt_in_interval_ms, 1000);
        assert_eq!(cfg.peer_idle_multiplier, 5);
        assert_eq!(cfg.request_timeout_ms, 2000);
    }

    #[test]
    fn idle_threshold_is_interval_times_multiplier() {
        let mut cfg = ClientConfig::default();
        cfg.opt_in_interval_ms = 1000;
        cfg.peer_idle_multiplier = 5;
        assert_eq!(cfg.idle_threshold_ms(), 5000);
    }
}
