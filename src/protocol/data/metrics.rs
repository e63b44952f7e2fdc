//! Data(Metrics) — sub-type 2. Per-layer playback counters.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 122;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    /// Not in spec.md's key-fields table, but offset 25 sits in the same
    /// subtype(24)/layerID(25)/reserved(26) gap that Cue and Waveform spell
    /// out explicitly — read here so layer_metrics(layer) replies can be
    /// routed by the correlation layer like every other Data sub-packet.
    pub layer_id: u8,
    pub state: u8,
    pub sync_master: u8,
    pub beat_marker: u8,
    pub track_length_ms: u32,
    pub current_position_ms: u32,
    pub speed: u32,
    pub beat_number: u32,
    /// BPM scaled by 100 (e.g. 12800 == 128.00 BPM).
    pub bpm_x100: u32,
    pub pitch_bend: u16,
    pub track_id: u32,
}

impl Metrics {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        Ok(Metrics {
            layer_id: r.read_u8(25)?,
            state: r.read_u8(27)?,
            sync_master: r.read_u8(29)?,
            beat_marker: r.read_u8(31)?,
            track_length_ms: r.read_u32_le(32)?,
            current_position_ms: r.read_u32_le(36)?,
            speed: r.read_u32_le(40)?,
            beat_number: r.read_u32_le(57)?,
            bpm_x100: r.read_u32_le(112)?,
            pitch_bend: r.read_u16_le(116)?,
            track_id: r.read_u32_le(118)?,
        })
    }
}
