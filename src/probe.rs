//! Candidate transcriber: turns the opening window of a video into a probe
//! transcript.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, EpisortError};
use crate::media::{AudioExtractorTrait, AudioWindow};
use crate::subtitle::normalize_transcript;
use crate::transcribe::TranscriberTrait;

/// A discovered video together with its probe transcript
#[derive(Debug, Clone)]
pub struct VideoCandidate {
    pub path: PathBuf,
    pub probe_transcript: String,
}

pub struct CandidateTranscriber {
    extractor: Box<dyn AudioExtractorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    window: AudioWindow,
    timeout: Option<Duration>,
}

impl CandidateTranscriber {
    pub fn new(
        extractor: Box<dyn AudioExtractorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        window: AudioWindow,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            extractor,
            transcriber,
            window,
            timeout,
        }
    }

    pub fn window(&self) -> AudioWindow {
        self.window
    }

    /// Check that both external tools can be run
    pub fn check_availability(&self) -> Result<()> {
        self.extractor.check_availability()?;
        self.transcriber.check_availability()
    }

    /// Extract, transcribe and normalise the probe window of `video_path`.
    ///
    /// The extracted audio lives in a scratch directory that is removed when
    /// this returns, whether it succeeds or not.
    pub async fn probe<P: AsRef<Path>>(&self, video_path: P) -> Result<VideoCandidate> {
        let video_path = video_path.as_ref();
        info!("Probing {}", video_path.display());

        let scratch = tempfile::Builder::new()
            .prefix("episort-probe-")
            .tempdir()
            .map_err(|e| EpisortError::Extraction {
                path: video_path.to_path_buf(),
                message: format!("failed to create scratch directory: {}", e),
            })?;
        let audio_path = scratch.path().join("probe.wav");

        self.extractor
            .extract_audio(video_path, &audio_path, self.window)
            .await
            .map_err(|e| EpisortError::Extraction {
                path: video_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let text = self.transcribe_bounded(video_path, &audio_path).await?;
        let probe_transcript = normalize_transcript(&text);
        if probe_transcript.trim().is_empty() {
            warn!("Transcriber heard nothing in {}", video_path.display());
        } else {
            debug!(
                "Probe transcript for {}: {} chars",
                video_path.display(),
                probe_transcript.chars().count()
            );
        }

        Ok(VideoCandidate {
            path: video_path.to_path_buf(),
            probe_transcript,
        })
    }

    async fn transcribe_bounded(&self, video_path: &Path, audio_path: &Path) -> Result<String> {
        let transcription = self.transcriber.transcribe(audio_path);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, transcription)
                .await
                .map_err(|_| EpisortError::Transcription {
                    path: video_path.to_path_buf(),
                    message: format!(
                        "{} did not finish within {}s",
                        self.transcriber.name(),
                        limit.as_secs()
                    ),
                })?,
            None => transcription.await,
        };

        result.map_err(|e| EpisortError::Transcription {
            path: video_path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
