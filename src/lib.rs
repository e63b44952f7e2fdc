//! A client library for TCNet, the UDP broadcast protocol Pioneer DJ
//! equipment (CDJs, mixers, rekordbox) use to exchange track metadata,
//! waveforms, cue points, mixer state, and peer discovery.
//!
//! Connect with [`TcNetClient::connect`] or [`TcNetClient::builder`],
//! observe the network via [`TcNetClient::events`] and [`TcNetClient::peers`],
//! and pull on-demand data (track info, metrics, cue points, mixer state,
//! waveforms) with the request methods on [`TcNetClient`].

pub mod client;
pub mod codec;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod peer;
pub mod protocol;
pub mod transport;

pub use client::{TcNetClient, TcNetClientBuilder};
pub use config::ClientConfig;
pub use error::{CodecError, ProtocolError, RemoteErrorCode, TcNetError};
pub use event::Event;
pub use peer::PeerInfo;
pub use protocol::constants::WaveformSize;
pub use protocol::Packet;
