use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, EpisortError};
use super::{AudioExtractorTrait, AudioWindow, MediaCommandBuilder};

/// Concrete implementation of the audio extractor (FFmpeg-based)
pub struct FfmpegExtractor {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegExtractor {
    /// Create a new ffmpeg extractor
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl AudioExtractorTrait for FfmpegExtractor {
    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        window: AudioWindow,
    ) -> Result<()> {
        info!(
            "Extracting {}s of audio from {} starting at {}s",
            window.duration.as_secs(),
            video_path.display(),
            window.start.as_secs()
        );

        let command = self.command_builder.extract_audio_window(video_path, audio_path, window);
        command.execute().await?;

        let size = tokio::fs::metadata(audio_path).await.map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(EpisortError::Media(format!(
                "ffmpeg produced no audio for {}",
                video_path.display()
            )));
        }

        debug!("Audio extraction completed ({} bytes)", size);
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| EpisortError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(EpisortError::Media("Media processor version check failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_binary_fails_check() {
        let config = MediaConfig {
            binary_path: "episort-no-such-ffmpeg".to_string(),
            ..MediaConfig::default()
        };
        let extractor = FfmpegExtractor::new(config);
        assert!(matches!(extractor.check_availability(), Err(EpisortError::Media(_))));
    }
}
