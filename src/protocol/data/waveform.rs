//! Data(Waveform) — sub-types 16 (Small) and 32 (Big).
//!
//! Waveform payloads are fragmented across multiple datagrams, reassembled
//! by the client façade using `packet_number`/`total_packet` (see
//! `client::waveform`). Per-sample layout: the reference source reads
//! alternating bytes as `color` then `level`; that interpretation is
//! preserved here unexamined, as flagged in spec.md §9 — it is not "fixed up".

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const SMALL_LEN: usize = 2442;
pub const BIG_LEN: usize = 4884;
const SAMPLES_START: usize = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformSample {
    pub color: u8,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    /// `DataSubType::SmallWaveform` or `DataSubType::BigWaveform` as decoded
    /// by the packet registry; carried here (rather than re-derived from
    /// buffer length) so the correlation layer can route fragments by the
    /// same `(data_type, layer)` key the request used.
    pub sub_type: u8,
    pub layer_id: u8,
    pub data_size: u32,
    pub total_packet: u32,
    pub packet_number: u32,
    pub samples: Vec<WaveformSample>,
}

impl Waveform {
    pub fn decode(buf: &[u8], sub_type: u8) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        let layer_id = r.read_u8(25)?;
        let data_size = r.read_u32_le(26)?;
        let total_packet = r.read_u32_le(30)?;
        let packet_number = r.read_u32_le(34)?;

        let available = buf.len().saturating_sub(SAMPLES_START);
        let pair_count = available / 2;
        let mut samples = Vec::with_capacity(pair_count);
        for i in 0..pair_count {
            let offset = SAMPLES_START + i * 2;
            samples.push(WaveformSample {
                color: r.read_u8(offset)?,
                level: r.read_u8(offset + 1)?,
            });
        }

        Ok(Waveform {
            sub_type,
            layer_id,
            data_size,
            total_packet,
            packet_number,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteWriter;

    #[test]
    fn decodes_header_fields_and_first_sample() {
        let mut buf = [0u8; SMALL_LEN];
        {
            let mut w = ByteWriter::new(&mut buf);
            w.write_u8(25, 1).unwrap();
            w.write_u32_le(26, 2400).unwrap();
            w.write_u32_le(30, 3).unwrap();
            w.write_u32_le(34, 0).unwrap();
            w.write_u8(SAMPLES_START, 10).unwrap();
            w.write_u8(SAMPLES_START + 1, 200).unwrap();
        }
        let wf = Waveform::decode(&buf, crate::protocol::constants::DataSubType::SmallWaveform.into()).unwrap();
        assert_eq!(wf.layer_id, 1);
        assert_eq!(wf.total_packet, 3);
        assert_eq!(wf.samples[0], WaveformSample { color: 10, level: 200 });
        assert_eq!(wf.samples.len(), (SMALL_LEN - SAMPLES_START) / 2);
    }
}
