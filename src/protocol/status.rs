//! Status (message type 5): per-layer source/status/track summary, 8 layers wide.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 300;
const LAYER_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub layer_source: [u8; LAYER_COUNT],
    pub layer_status: [u8; LAYER_COUNT],
    pub track_id: [u32; LAYER_COUNT],
    pub smpte_mode: u8,
    pub auto_master_mode: u8,
    pub layer_name: [String; LAYER_COUNT],
}

impl Status {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);

        let mut layer_source = [0u8; LAYER_COUNT];
        for (i, slot) in layer_source.iter_mut().enumerate() {
            *slot = r.read_u8(34 + i)?;
        }

        let mut layer_status = [0u8; LAYER_COUNT];
        for (i, slot) in layer_status.iter_mut().enumerate() {
            *slot = r.read_u8(42 + i)?;
        }

        let mut track_id = [0u32; LAYER_COUNT];
        for (i, slot) in track_id.iter_mut().enumerate() {
            *slot = r.read_u32_le(50 + i * 4)?;
        }

        let smpte_mode = r.read_u8(83)?;
        let auto_master_mode = r.read_u8(84)?;

        let layer_name: [String; LAYER_COUNT] = {
            let mut names: Vec<String> = Vec::with_capacity(LAYER_COUNT);
            for i in 0..LAYER_COUNT {
                names.push(r.read_ascii(172 + i * 16, 16)?);
            }
            names.try_into().expect("exactly LAYER_COUNT entries")
        };

        Ok(Status {
            layer_source,
            layer_status,
            track_id,
            smpte_mode,
            auto_master_mode,
            layer_name,
        })
    }
}
