//! Wire types: the management header, each message-type body, and the
//! packet registry that ties a decoded header to its typed body.

pub mod constants;
pub mod data;
pub mod error_notify;
pub mod header;
pub mod optin;
pub mod optout;
pub mod packet;
pub mod request;
pub mod status;
pub mod time;
pub mod timesync;

pub use constants::{DataSubType, MessageType, NodeType, WaveformSize};
pub use error_notify::ErrorNotify;
pub use header::{Header, HeaderError};
pub use optin::OptIn;
pub use optout::OptOut;
pub use packet::{decode, Packet};
pub use request::Request;
pub use status::Status;
pub use time::{Time, Timecode, TimecodeState};
pub use timesync::TimeSync;
