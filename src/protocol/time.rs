//! Time (message type 254): per-layer transport time and SMPTE-style timecode.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 154;
const LAYER_COUNT: usize = 8;

/// Timecode running state, per §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeState {
    Stopped,
    Running,
    ForceResync,
    Unknown(u8),
}

impl From<u8> for TimecodeState {
    fn from(b: u8) -> Self {
        match b {
            0 => Self::Stopped,
            1 => Self::Running,
            2 => Self::ForceResync,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    pub mode: u8,
    pub state: TimecodeState,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Timecode {
    fn decode(r: &ByteReader<'_>, offset: usize) -> Result<Self, CodecError> {
        Ok(Timecode {
            mode: r.read_u8(offset)?,
            state: TimecodeState::from(r.read_u8(offset + 1)?),
            hours: r.read_u8(offset + 2)?,
            minutes: r.read_u8(offset + 3)?,
            seconds: r.read_u8(offset + 4)?,
            frames: r.read_u8(offset + 5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Time {
    pub layer_current_time: [u32; LAYER_COUNT],
    pub layer_total_time: [u32; LAYER_COUNT],
    pub beat_marker: [u8; LAYER_COUNT],
    pub state: [u8; LAYER_COUNT],
    pub smpte_mode: u8,
    pub timecode: [Timecode; LAYER_COUNT],
}

impl Time {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);

        let mut layer_current_time = [0u32; LAYER_COUNT];
        for (i, slot) in layer_current_time.iter_mut().enumerate() {
            *slot = r.read_u32_le(24 + i * 4)?;
        }

        let mut layer_total_time = [0u32; LAYER_COUNT];
        for (i, slot) in layer_total_time.iter_mut().enumerate() {
            *slot = r.read_u32_le(56 + i * 4)?;
        }

        let mut beat_marker = [0u8; LAYER_COUNT];
        for (i, slot) in beat_marker.iter_mut().enumerate() {
            *slot = r.read_u8(88 + i)?;
        }

        let mut state = [0u8; LAYER_COUNT];
        for (i, slot) in state.iter_mut().enumerate() {
            *slot = r.read_u8(96 + i)?;
        }

        let smpte_mode = r.read_u8(105)?;

        let mut timecode = [Timecode {
            mode: 0,
            state: TimecodeState::Stopped,
            hours: 0,
            minutes: 0,
            seconds: 0,
            frames: 0,
        }; LAYER_COUNT];
        for (i, slot) in timecode.iter_mut().enumerate() {
            *slot = Timecode::decode(&r, 106 + i * 6)?;
        }

        Ok(Time {
            layer_current_time,
            layer_total_time,
            beat_marker,
            state,
            smpte_mode,
            timecode,
        })
    }
}
