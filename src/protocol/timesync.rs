//! TimeSync (message type 10).
//!
//! The reference implementation reads `node_listener_support` from absolute
//! offset 2 — inside the management header, overlapping `major_version` —
//! which is almost certainly a source bug. This decoder reads it from body
//! offset 26 instead, per the redesign decision recorded in SPEC_FULL.md.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSync {
    pub step: u8,
    /// Deviates from the reference source's header-offset-2 read; see module docs.
    pub node_listener_support: u16,
    pub remote_timestamp: u32,
}

impl TimeSync {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        Ok(TimeSync {
            step: r.read_u8(24)?,
            node_listener_support: r.read_u16_le(26)?,
            remote_timestamp: r.read_u32_le(28)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ByteWriter;

    #[test]
    fn reads_support_from_body_offset() {
        let mut buf = [0u8; LEN];
        let mut w = ByteWriter::new(&mut buf);
        w.write_u8(24, 1).unwrap();
        w.write_u16_le(26, 7).unwrap();
        w.write_u32_le(28, 99).unwrap();

        let ts = TimeSync::decode(&buf).unwrap();
        assert_eq!(ts.step, 1);
        assert_eq!(ts.node_listener_support, 7);
        assert_eq!(ts.remote_timestamp, 99);
    }
}
