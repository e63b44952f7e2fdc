//! Message-type codes, data sub-type codes, and other wire constants.

/// UDP port TCNet listens/broadcasts on by default.
pub const DEFAULT_BROADCAST_PORT: u16 = 60000;

/// Default interval between OptIn keep-alive announcements.
pub const DEFAULT_OPTIN_INTERVAL_MS: u64 = 1000;

/// Default multiplier on the OptIn interval after which a silent peer is evicted.
pub const DEFAULT_PEER_IDLE_MULTIPLIER: u32 = 5;

/// Default deadline for `request_data`.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;

/// Default cap on how long `connect()` waits for a first peer before
/// returning anyway.
pub const DEFAULT_DISCOVERY_GRACE_MS: u64 = 300;

/// Length in bytes of the management header prefix on every packet.
pub const HEADER_LEN: usize = 24;

/// ASCII magic bytes every management header must carry at offset 4..7.
pub const MAGIC: &[u8; 3] = b"TCN";

/// Supported major protocol version.
pub const MAJOR_VERSION: u8 = 3;

/// Node role, carried at header offset 17.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Auto,
    Master,
    Slave,
    Repeater,
    Unknown(u8),
}

impl From<u8> for NodeType {
    fn from(b: u8) -> Self {
        match b {
            1 => Self::Auto,
            2 => Self::Master,
            4 => Self::Slave,
            8 => Self::Repeater,
            other => Self::Unknown(other),
        }
    }
}

impl From<NodeType> for u8 {
    fn from(t: NodeType) -> Self {
        match t {
            NodeType::Auto => 1,
            NodeType::Master => 2,
            NodeType::Slave => 4,
            NodeType::Repeater => 8,
            NodeType::Unknown(b) => b,
        }
    }
}

/// Message type byte at header offset 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    OptIn,
    OptOut,
    Status,
    TimeSync,
    Error,
    Request,
    ApplicationData,
    Control,
    Text,
    Keyboard,
    Data,
    File,
    Time,
    Unknown(u8),
}

impl From<u8> for MessageType {
    fn from(b: u8) -> Self {
        match b {
            2 => Self::OptIn,
            3 => Self::OptOut,
            5 => Self::Status,
            10 => Self::TimeSync,
            13 => Self::Error,
            20 => Self::Request,
            30 => Self::ApplicationData,
            101 => Self::Control,
            128 => Self::Text,
            132 => Self::Keyboard,
            200 => Self::Data,
            204 => Self::File,
            254 => Self::Time,
            other => Self::Unknown(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(t: MessageType) -> Self {
        match t {
            MessageType::OptIn => 2,
            MessageType::OptOut => 3,
            MessageType::Status => 5,
            MessageType::TimeSync => 10,
            MessageType::Error => 13,
            MessageType::Request => 20,
            MessageType::ApplicationData => 30,
            MessageType::Control => 101,
            MessageType::Text => 128,
            MessageType::Keyboard => 132,
            MessageType::Data => 200,
            MessageType::File => 204,
            MessageType::Time => 254,
            MessageType::Unknown(b) => b,
        }
    }
}

/// Data-packet sub-type byte at offset 24 of any `Data` (200) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSubType {
    Metrics,
    Metadata,
    BeatGrid,
    Cue,
    SmallWaveform,
    BigWaveform,
    Mixer,
    Unknown(u8),
}

impl From<u8> for DataSubType {
    fn from(b: u8) -> Self {
        match b {
            2 => Self::Metrics,
            4 => Self::Metadata,
            8 => Self::BeatGrid,
            12 => Self::Cue,
            16 => Self::SmallWaveform,
            32 => Self::BigWaveform,
            150 => Self::Mixer,
            other => Self::Unknown(other),
        }
    }
}

impl From<DataSubType> for u8 {
    fn from(t: DataSubType) -> Self {
        match t {
            DataSubType::Metrics => 2,
            DataSubType::Metadata => 4,
            DataSubType::BeatGrid => 8,
            DataSubType::Cue => 12,
            DataSubType::SmallWaveform => 16,
            DataSubType::BigWaveform => 32,
            DataSubType::Mixer => 150,
            DataSubType::Unknown(b) => b,
        }
    }
}

/// Waveform fragment size variant requested by the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformSize {
    Small,
    Big,
}

/// Error codes a peer may return in an Error (13) notification.
pub mod error_code {
    pub const REQUEST_UNKNOWN: u16 = 0;
    pub const REQUEST_NOT_POSSIBLE: u16 = 13;
    pub const REQUEST_DATA_EMPTY: u16 = 14;
    pub const REQUEST_RESPONSE_OK: u16 = 255;
}
