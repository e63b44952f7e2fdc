//! Socket construction and the receive loop (spec.md §4.3).
//!
//! Two sockets: a broadcast socket bound to `DEFAULT_BROADCAST_PORT` that
//! sends/receives OptIn, OptOut, Status, TimeSync, Time, and broadcast Data,
//! and a unicast socket (ephemeral port) used for Request/reply traffic.
//! Both are built with `socket2::Socket` so options can be set before
//! `bind()`, then converted to `tokio::net::UdpSocket` — the same sequence
//! as the teacher's `bind_reusable_udp`.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::TcNetError;

/// Largest fixed-size packet on the wire (`BigWaveform`); the receive loop
/// reuses a buffer this size for every datagram.
pub const MAX_DATAGRAM_LEN: usize = crate::protocol::data::waveform::BIG_LEN;

/// Which socket a datagram arrived on, so the dispatcher can tell an
/// unsolicited broadcast apart from a reply to our own unicast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Broadcast,
    Unicast,
}

/// A raw datagram handed from a receive loop to the dispatcher.
pub struct Datagram {
    pub src: SocketAddr,
    pub bytes: Vec<u8>,
    pub kind: SocketKind,
}

/// Binds a UDP socket with `SO_REUSEADDR` (and, off Windows, `SO_REUSEPORT`)
/// so multiple clients on one host can share `port`, and with
/// `SO_BROADCAST` enabled so it can send to the subnet broadcast address.
pub fn bind_broadcast_udp(port: u16) -> Result<UdpSocket, TcNetError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(not(target_os = "windows"))]
    socket.set_reuse_port(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&socket2::SockAddr::from(addr))?;

    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

/// Binds the unicast request/reply socket on an OS-assigned ephemeral port.
pub fn bind_unicast_udp() -> Result<UdpSocket, TcNetError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0);
    socket.bind(&socket2::SockAddr::from(addr))?;

    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

/// Resolves the subnet broadcast address for the selected (or default)
/// interface: `(ip & netmask) | !netmask`, at `port`.
///
/// `local-ip-address` doesn't expose a netmask, only the address list, so
/// on Linux this shells out to `ip -4 addr show` to read the CIDR prefix
/// directly (mirroring the interface-discovery fallback the wider TCNet
/// protocol ecosystem uses); elsewhere it falls back to the crate's address
/// list and assumes a `/24`, logging a warning since that assumption can be
/// wrong on non-standard subnets.
pub fn resolve_broadcast_addr(interface: Option<&str>, port: u16) -> Result<SocketAddr, TcNetError> {
    let (ip, prefix_len) = resolve_interface_ipv4(interface)?;
    let netmask = prefix_to_netmask(prefix_len);
    let broadcast = u32::from(ip) | !netmask;
    Ok(SocketAddr::V4(SocketAddrV4::new(
        Ipv4Addr::from(broadcast),
        port,
    )))
}

fn prefix_to_netmask(prefix_len: u32) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        u32::MAX << (32 - prefix_len)
    }
}

#[cfg(target_os = "linux")]
fn resolve_interface_ipv4(interface: Option<&str>) -> Result<(Ipv4Addr, u32), TcNetError> {
    use std::process::Command;

    let output = Command::new("ip").args(["-4", "addr", "show"]).output();
    let output = match output {
        Ok(o) if o.status.success() => o,
        _ => {
            log::debug!("transport: 'ip' command unavailable, falling back to local-ip-address");
            return resolve_interface_ipv4_fallback(interface);
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut current_name = String::new();
    for line in stdout.lines() {
        if !line.starts_with(' ') {
            current_name = line.split(':').nth(1).unwrap_or("").trim().to_string();
            continue;
        }
        if let Some(name) = interface {
            if current_name != name {
                continue;
            }
        } else if current_name == "lo" {
            continue;
        }
        if let Some(inet_part) = line.trim().strip_prefix("inet ") {
            let mut parts = inet_part.split('/');
            let addr = parts.next().and_then(|s| s.parse::<Ipv4Addr>().ok());
            let prefix = parts.next().and_then(|s| s.parse::<u32>().ok());
            if let (Some(addr), Some(prefix)) = (addr, prefix) {
                return Ok((addr, prefix));
            }
        }
    }

    log::debug!("transport: no matching interface in 'ip addr show' output, falling back");
    resolve_interface_ipv4_fallback(interface)
}

#[cfg(not(target_os = "linux"))]
fn resolve_interface_ipv4(interface: Option<&str>) -> Result<(Ipv4Addr, u32), TcNetError> {
    resolve_interface_ipv4_fallback(interface)
}

fn resolve_interface_ipv4_fallback(interface: Option<&str>) -> Result<(Ipv4Addr, u32), TcNetError> {
    use std::net::IpAddr;

    let interfaces = local_ip_address::list_afinet_netifas()
        .map_err(|e| TcNetError::Io(format!("interface enumeration failed: {e}")))?;

    let chosen = interfaces.into_iter().find_map(|(name, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() => match interface {
            Some(wanted) if wanted == name => Some(v4),
            Some(_) => None,
            None => Some(v4),
        },
        _ => None,
    });

    match chosen {
        Some(v4) => {
            log::warn!(
                "transport: no netmask available for {v4} via local-ip-address, assuming /24"
            );
            Ok((v4, 24))
        }
        None => Err(TcNetError::Io(
            "no non-loopback IPv4 interface found".into(),
        )),
    }
}

/// Spawns a task that reads datagrams off `socket` and forwards each one,
/// tagged with its source address, to `tx`. Exits when `cancel` fires or the
/// channel's receiver is dropped.
pub fn spawn_receive_loop(
    socket: std::sync::Arc<UdpSocket>,
    kind: SocketKind,
    tx: mpsc::Sender<Datagram>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, src)) => {
                            let datagram = Datagram { src, bytes: buf[..len].to_vec(), kind };
                            if tx.send(datagram).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            log::warn!("transport: recv_from failed: {e}");
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netmask_math() {
        assert_eq!(prefix_to_netmask(24), 0xFFFFFF00);
        assert_eq!(prefix_to_netmask(0), 0);
        assert_eq!(prefix_to_netmask(32), 0xFFFFFFFF);
    }

    #[tokio::test]
    async fn broadcast_socket_binds_and_is_nonblocking() {
        let socket = bind_broadcast_udp(0).unwrap();
        assert!(socket.local_addr().is_ok());
    }

    #[tokio::test]
    async fn receive_loop_forwards_datagrams_and_stops_on_cancel() {
        let recv_socket = std::sync::Arc::new(bind_unicast_udp().unwrap());
        let recv_addr = recv_socket.local_addr().unwrap();
        let send_socket = bind_unicast_udp().unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = spawn_receive_loop(recv_socket, SocketKind::Unicast, tx, cancel.clone());

        send_socket.send_to(b"hello", recv_addr).await.unwrap();
        let datagram = rx.recv().await.unwrap();
        assert_eq!(datagram.bytes, b"hello");

        cancel.cancel();
        handle.await.unwrap();
    }
}
