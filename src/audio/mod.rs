pub mod ffmpeg;
pub mod silencedetect;

pub use ffmpeg::{
    check_ffmpeg, check_ffprobe, collect_numbered_mp3s, concat_inputs, export_segment,
    probe_duration, render_analysis_wav,
};
pub use silencedetect::detect_silences;

use std::time::Duration;

/// Metadata about an audio file.
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

/// A quiet span reported by the external silence detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SilenceInterval {
    pub start: Duration,
    pub end: Duration,
}

impl SilenceInterval {
    /// Get the length of this silence span.
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}
