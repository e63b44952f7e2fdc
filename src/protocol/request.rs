//! Request (message type 20): unicast request for a data-packet payload.

use crate::codec::{ByteReader, ByteWriter};
use crate::error::CodecError;

pub const LEN: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub data_type: u8,
    pub layer: u8,
}

impl Request {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);
        Ok(Request {
            data_type: r.read_u8(24)?,
            layer: r.read_u8(25)?,
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<(), CodecError> {
        let mut w = ByteWriter::new(buf);
        w.write_u8(24, self.data_type)?;
        w.write_u8(25, self.layer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let req = Request {
            data_type: 4,
            layer: 2,
        };
        let mut buf = [0u8; LEN];
        req.encode(&mut buf).unwrap();
        assert_eq!(Request::decode(&buf).unwrap(), req);
    }
}
