//! OptIn (message type 2): broadcast announcement that a node is joining.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::CodecError;

pub const LEN: usize = 68;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptIn {
    pub node_count: u16,
    pub listener_port: u16,
    pub uptime: u16,
    pub vendor_name: String,
    pub app_name: String,
    pub major: u8,
    pub minor: u8,
    pub bug: u8,
}

impl OptIn {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        Ok(OptIn {
            node_count: r.read_u16_le(24)?,
            listener_port: r.read_u16_le(26)?,
            uptime: r.read_u16_le(28)?,
            vendor_name: r.read_ascii(32, 16)?,
            app_name: r.read_ascii(48, 16)?,
            major: r.read_u8(64)?,
            minor: r.read_u8(65)?,
            bug: r.read_u8(66)?,
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<(), CodecError> {
        let mut w = ByteWriter::new(buf);
        w.write_u16_le(24, self.node_count)?;
        w.write_u16_le(26, self.listener_port)?;
        w.write_u16_le(28, self.uptime)?;
        w.write_ascii(32, 16, &self.vendor_name, 0x00)?;
        w.write_ascii(48, 16, &self.app_name, 0x00)?;
        w.write_u8(64, self.major)?;
        w.write_u8(65, self.minor)?;
        w.write_u8(66, self.bug)?;
        Ok(())
    }
}
