//! Data(MixerData) — sub-type 150. Mixer-wide continuous controls plus
//! 6 fixed-offset channel strips.

use crate::codec::ByteReader;
use crate::error::CodecError;

pub const LEN: usize = 548;
const CHANNEL_COUNT: usize = 6;
const CHANNEL_OFFSETS: [usize; CHANNEL_COUNT] = [125, 149, 173, 197, 221, 245];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixerChannel {
    pub source: u8,
    pub audio_level: u8,
    pub fader: u8,
    pub trim: u8,
    pub comp: u8,
    pub eq_hi: u8,
    pub eq_hi_mid: u8,
    pub eq_low_mid: u8,
    pub eq_low: u8,
    pub filter_color: u8,
    pub send: u8,
    pub cue_a: bool,
    pub cue_b: bool,
    pub crossfader_assign: u8,
}

impl MixerChannel {
    fn decode(r: &ByteReader<'_>, offset: usize) -> Result<Self, CodecError> {
        Ok(MixerChannel {
            source: r.read_u8(offset)?,
            audio_level: r.read_u8(offset + 1)?,
            fader: r.read_u8(offset + 2)?,
            trim: r.read_u8(offset + 3)?,
            comp: r.read_u8(offset + 4)?,
            eq_hi: r.read_u8(offset + 5)?,
            eq_hi_mid: r.read_u8(offset + 6)?,
            eq_low_mid: r.read_u8(offset + 7)?,
            eq_low: r.read_u8(offset + 8)?,
            filter_color: r.read_u8(offset + 9)?,
            send: r.read_u8(offset + 10)?,
            cue_a: r.read_u8(offset + 11)? != 0,
            cue_b: r.read_u8(offset + 12)? != 0,
            crossfader_assign: r.read_u8(offset + 13)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerData {
    pub mixer_id: u8,
    pub mixer_type: u8,
    pub mixer_name: String,
    pub mic_eq_hi: u8,
    pub mic_eq_low: u8,
    pub master_audio: u8,
    pub master_fader: u8,
    pub link_cue_a: u8,
    pub link_cue_b: u8,
    pub master_filter: u8,
    pub master_cue_a: u8,
    pub master_cue_b: u8,
    pub master_isolator_on_off: u8,
    pub iso_hi: u8,
    pub iso_mid: u8,
    pub iso_low: u8,
    pub filter_hpf: u8,
    pub filter_lpf: u8,
    pub filter_res: u8,
    pub send_fx_effect: u8,
    pub send_fx_ext1: u8,
    pub send_fx_ext2: u8,
    pub send_fx_master_mix: u8,
    pub size_feedback: u8,
    pub fx_time: u8,
    pub fx_hpf: u8,
    pub fx_level: u8,
    pub send_return3_source: u8,
    pub send_return3_type: u8,
    pub send_return3_on_off: u8,
    pub send_return3_level: u8,
    pub ch_fader_curve: u8,
    pub xf_curve: u8,
    pub xfader: u8,
    pub beat_fx_on_off: u8,
    pub beat_fx_depth: u8,
    pub beat_fx_channel: u8,
    pub beat_fx_select: u8,
    pub beat_fx_freq_hi: u8,
    pub beat_fx_freq_mid: u8,
    pub beat_fx_freq_low: u8,
    pub hp_pre_eq: u8,
    pub hp_a_level: u8,
    pub hp_a_mix: u8,
    pub hp_b_level: u8,
    pub hp_b_mix: u8,
    pub booth_level: u8,
    pub booth_eq_hi: u8,
    pub booth_eq_low: u8,
    pub channels: [MixerChannel; CHANNEL_COUNT],
}

impl MixerData {
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let r = ByteReader::new(buf);

        let mut channels = [MixerChannel::default(); CHANNEL_COUNT];
        for (i, offset) in CHANNEL_OFFSETS.into_iter().enumerate() {
            channels[i] = MixerChannel::decode(&r, offset)?;
        }

        Ok(MixerData {
            mixer_id: r.read_u8(25)?,
            mixer_type: r.read_u8(26)?,
            mixer_name: r.read_ascii(29, 16)?,
            mic_eq_hi: r.read_u8(59)?,
            mic_eq_low: r.read_u8(60)?,
            master_audio: r.read_u8(61)?,
            master_fader: r.read_u8(62)?,
            link_cue_a: r.read_u8(67)?,
            link_cue_b: r.read_u8(68)?,
            master_filter: r.read_u8(69)?,
            master_cue_a: r.read_u8(71)?,
            master_cue_b: r.read_u8(72)?,
            master_isolator_on_off: r.read_u8(74)?,
            iso_hi: r.read_u8(75)?,
            iso_mid: r.read_u8(76)?,
            iso_low: r.read_u8(77)?,
            filter_hpf: r.read_u8(79)?,
            filter_lpf: r.read_u8(80)?,
            filter_res: r.read_u8(81)?,
            send_fx_effect: r.read_u8(84)?,
            send_fx_ext1: r.read_u8(85)?,
            send_fx_ext2: r.read_u8(86)?,
            send_fx_master_mix: r.read_u8(87)?,
            size_feedback: r.read_u8(88)?,
            fx_time: r.read_u8(89)?,
            fx_hpf: r.read_u8(90)?,
            fx_level: r.read_u8(91)?,
            send_return3_source: r.read_u8(92)?,
            send_return3_type: r.read_u8(93)?,
            send_return3_on_off: r.read_u8(94)?,
            send_return3_level: r.read_u8(95)?,
            ch_fader_curve: r.read_u8(97)?,
            xf_curve: r.read_u8(98)?,
            xfader: r.read_u8(99)?,
            beat_fx_on_off: r.read_u8(100)?,
            beat_fx_depth: r.read_u8(101)?,
            beat_fx_channel: r.read_u8(102)?,
            beat_fx_select: r.read_u8(103)?,
            beat_fx_freq_hi: r.read_u8(104)?,
            beat_fx_freq_mid: r.read_u8(105)?,
            beat_fx_freq_low: r.read_u8(106)?,
            hp_pre_eq: r.read_u8(107)?,
            hp_a_level: r.read_u8(108)?,
            hp_a_mix: r.read_u8(109)?,
            hp_b_level: r.read_u8(110)?,
            hp_b_mix: r.read_u8(111)?,
            booth_level: r.read_u8(112)?,
            booth_eq_hi: r.read_u8(113)?,
            booth_eq_low: r.read_u8(114)?,
            channels,
        })
    }
}
