// Audio extraction
//
// The probe only needs a short mono PCM excerpt of each video:
// - Processor: ffmpeg-backed implementation of the extractor trait
// - Commands: command builders and abstractions

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Portion of a video to extract, and the PCM format to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioWindow {
    pub start: Duration,
    pub duration: Duration,
    pub sample_rate: u32,
}

impl AudioWindow {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            start: Duration::from_secs(config.window_start_secs),
            duration: Duration::from_secs(config.window_duration_secs),
            sample_rate: config.sample_rate,
        }
    }
}

/// Produces single-channel PCM audio for a window of a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioExtractorTrait: Send + Sync {
    /// Extract `window` of `video_path` into a WAV file at `audio_path`
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        window: AudioWindow,
    ) -> Result<()>;

    /// Check if the extractor is available
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating audio extractor instances
pub struct AudioExtractorFactory;

impl AudioExtractorFactory {
    /// Create the default audio extractor implementation (FFmpeg-based)
    pub fn create_extractor(config: MediaConfig) -> Box<dyn AudioExtractorTrait> {
        Box::new(processor::FfmpegExtractor::new(config))
    }
}
