//! The packet registry: one exhaustive match from a decoded `Header` to a
//! typed `Packet`, standing in for what would otherwise be a dynamic
//! dispatch table keyed by message type.

use crate::codec::ByteReader;
use crate::error::TcNetError;
use crate::protocol::constants::{DataSubType, MessageType};
use crate::protocol::data::{CueData, Metadata, Metrics, MixerData, Waveform};
use crate::protocol::header::Header;
use crate::protocol::{ErrorNotify, OptIn, OptOut, Request, Status, Time, TimeSync};

/// A decoded datagram: the management header plus its typed body.
///
/// `Unsupported` covers message types and data sub-types that the wire
/// format defines but this client does not decode further (BeatGrid,
/// Control, Text, Keyboard, File) — the header still parses and the caller
/// can see what arrived without the receive loop treating it as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    OptIn(OptIn),
    OptOut(OptOut),
    Status(Status),
    TimeSync(TimeSync),
    Error(ErrorNotify),
    Request(Request),
    Time(Time),
    Metrics(Metrics),
    Metadata(Metadata),
    Cue(CueData),
    Waveform(Waveform),
    Mixer(MixerData),
    Unsupported {
        message_type: u8,
        data_sub_type: Option<u8>,
    },
}

/// Decodes the management header and dispatches to the matching body
/// decoder. Returns the header alongside the body so callers can read
/// `node_id`, `sequence`, and `node_type` without re-parsing.
pub fn decode(buf: &[u8]) -> Result<(Header, Packet), TcNetError> {
    let header = Header::decode(buf)?;

    let packet = match header.message_type {
        MessageType::OptIn => Packet::OptIn(OptIn::decode(buf)?),
        MessageType::OptOut => Packet::OptOut(OptOut::decode(buf)?),
        MessageType::Status => Packet::Status(Status::decode(buf)?),
        MessageType::TimeSync => Packet::TimeSync(TimeSync::decode(buf)?),
        MessageType::Error => Packet::Error(ErrorNotify::decode(buf)?),
        MessageType::Request => Packet::Request(Request::decode(buf)?),
        MessageType::Time => Packet::Time(Time::decode(buf)?),
        MessageType::Data => decode_data(buf)?,
        MessageType::ApplicationData
        | MessageType::Control
        | MessageType::Text
        | MessageType::Keyboard
        | MessageType::File
        | MessageType::Unknown(_) => Packet::Unsupported {
            message_type: header.message_type.into(),
            data_sub_type: None,
        },
    };

    Ok((header, packet))
}

fn decode_data(buf: &[u8]) -> Result<Packet, TcNetError> {
    let r = ByteReader::new(buf);
    let sub_type_byte = r.read_u8(24)?;
    let sub_type = DataSubType::from(sub_type_byte);

    Ok(match sub_type {
        DataSubType::Metrics => Packet::Metrics(Metrics::decode(buf)?),
        DataSubType::Metadata => Packet::Metadata(Metadata::decode(buf)?),
        DataSubType::Cue => Packet::Cue(CueData::decode(buf)?),
        DataSubType::SmallWaveform | DataSubType::BigWaveform => {
            Packet::Waveform(Waveform::decode(buf, sub_type_byte)?)
        }
        DataSubType::Mixer => Packet::Mixer(MixerData::decode(buf)?),
        DataSubType::BeatGrid | DataSubType::Unknown(_) => Packet::Unsupported {
            message_type: MessageType::Data.into(),
            data_sub_type: Some(sub_type_byte),
        },
    })
}
