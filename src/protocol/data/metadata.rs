//! Data(Metadata) — sub-type 4. Track artist/title/key.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 548;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Read from the same subtype(24)/layerID(25) gap as Cue and Waveform;
    /// see the note on `Metrics::layer_id`.
    pub layer_id: u8,
    pub track_artist: String,
    pub track_title: String,
    pub track_key: u16,
    pub track_id: u32,
}

impl Metadata {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        Ok(Metadata {
            layer_id: r.read_u8(25)?,
            track_artist: r.read_utf16_le(29, 256)?,
            track_title: r.read_utf16_le(285, 256)?,
            track_key: r.read_u16_le(541)?,
            track_id: r.read_u32_le(543)?,
        })
    }
}
