//! Data(200) sub-packet bodies, keyed by `DataSubType`.

pub mod cue;
pub mod metadata;
pub mod metrics;
pub mod mixer;
pub mod waveform;

pub use cue::CueData;
pub use metadata::Metadata;
pub use metrics::Metrics;
pub use mixer::MixerData;
pub use waveform::{Waveform, WaveformSample};
