//! The 24-byte management header prefixing every TCNet datagram.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CodecError, ProtocolError};
use crate::protocol::constants::{MessageType, NodeType, HEADER_LEN, MAGIC, MAJOR_VERSION};

/// Fields present at fixed offsets on every packet, validated before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub node_id: u16,
    pub major_version: u8,
    pub minor_version: u8,
    pub message_type: MessageType,
    pub node_name: String,
    pub sequence: u8,
    pub node_type: NodeType,
    pub node_options: u16,
    pub timestamp: u32,
}

impl Header {
    /// Decodes and validates the header. Mismatched magic or major version
    /// yields `ProtocolError`; a buffer shorter than `HEADER_LEN` yields
    /// `CodecError::Truncated`.
    pub fn decode(buf: &[u8]) -> Result<Self, HeaderError> {
        let r = ByteReader::new(buf);
        if r.len() < HEADER_LEN {
            return Err(HeaderError::Codec(CodecError::Truncated {
                needed: HEADER_LEN,
                available: r.len(),
            }));
        }

        let node_id = r.read_u16_le(0)?;
        let major_version = r.read_u8(2)?;
        if major_version != MAJOR_VERSION {
            return Err(HeaderError::Protocol(ProtocolError::BadVersion));
        }
        let minor_version = r.read_u8(3)?;
        let magic = r.read_bytes(4, 3)?;
        if magic != MAGIC {
            return Err(HeaderError::Protocol(ProtocolError::BadMagic));
        }
        let message_type = MessageType::from(r.read_u8(7)?);
        let node_name = r.read_ascii(8, 8)?;
        let sequence = r.read_u8(16)?;
        let node_type = NodeType::from(r.read_u8(17)?);
        let node_options = r.read_u16_le(18)?;
        let timestamp = r.read_u32_le(20)?;

        Ok(Header {
            node_id,
            major_version,
            minor_version,
            message_type,
            node_name,
            sequence,
            node_type,
            node_options,
            timestamp,
        })
    }

    /// Encodes the header into the first `HEADER_LEN` bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) -> Result<(), CodecError> {
        let mut w = ByteWriter::new(buf);
        w.write_u16_le(0, self.node_id)?;
        w.write_u8(2, self.major_version)?;
        w.write_u8(3, self.minor_version)?;
        w.write_bytes(4, MAGIC)?;
        w.write_u8(7, self.message_type.into())?;
        w.write_ascii(8, 8, &self.node_name, 0x00)?;
        w.write_u8(16, self.sequence)?;
        w.write_u8(17, self.node_type.into())?;
        w.write_u16_le(18, self.node_options)?;
        w.write_u32_le(20, self.timestamp)?;
        Ok(())
    }
}

/// Header-level decode failure: distinguishes truncation (no packet at all)
/// from a well-sized but invalid frame (wrong magic/version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    Codec(CodecError),
    Protocol(ProtocolError),
}

impl From<CodecError> for HeaderError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<HeaderError> for crate::error::TcNetError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::Codec(c) => c.into(),
            HeaderError::Protocol(p) => p.into(),
        }
    }
}
