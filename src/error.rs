//! Error taxonomy for the TCNet client.
//!
//! Codec and protocol errors are never fatal to a session — the offending
//! datagram is logged and dropped by the receive loop. Only `Io` transitions
//! the client into a failed state (see `client::TcNetClient`).

use thiserror::Error;

/// Errors surfaced while decoding or encoding a single packet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer truncated: needed {needed} bytes, had {available}")]
    Truncated { needed: usize, available: usize },
    #[error("invalid encoding at offset {offset}")]
    InvalidEncoding { offset: usize },
}

/// Errors raised while validating or dispatching a packet's header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("bad magic bytes in management header")]
    BadMagic,
    #[error("unsupported major version")]
    BadVersion,
    #[error("recognized but undecodable packet: message_type={message_type}, data_sub_type={data_sub_type:?}")]
    Unsupported {
        message_type: u8,
        data_sub_type: Option<u8>,
    },
}

/// Error codes carried by a peer's Error (message type 13) notification.
///
/// `REQUEST_RESPONSE_OK` (255) is not an error and is never wrapped in
/// `TcNetError::Remote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCode {
    RequestUnknown,
    RequestNotPossible,
    RequestDataEmpty,
    Other(u16),
}

impl From<u16> for RemoteErrorCode {
    fn from(code: u16) -> Self {
        match code {
            0 => Self::RequestUnknown,
            13 => Self::RequestNotPossible,
            14 => Self::RequestDataEmpty,
            other => Self::Other(other),
        }
    }
}

impl RemoteErrorCode {
    pub fn code(self) -> u16 {
        match self {
            Self::RequestUnknown => 0,
            Self::RequestNotPossible => 13,
            Self::RequestDataEmpty => 14,
            Self::Other(c) => c,
        }
    }
}

/// The one public error type returned from every fallible client operation.
#[derive(Debug, Error, Clone)]
pub enum TcNetError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("peer {node_id} returned error code {code:?} for data_type={data_type} layer={layer}")]
    Remote {
        node_id: u16,
        data_type: u8,
        layer: u8,
        code: RemoteErrorCode,
    },

    #[error("request for data_type={data_type} layer={layer} timed out")]
    Timeout { data_type: u8, layer: u8 },

    #[error("peer {node_id} was evicted before a reply arrived")]
    PeerGone { node_id: u16 },

    #[error("no peer available to satisfy the request")]
    NoPeer,

    #[error("client was disconnected")]
    Shutdown,

    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TcNetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TcNetError>;
