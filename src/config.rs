use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{Result, EpisortError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub media: MediaConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Which speech-to-text command line tool to drive
    pub implementation: TranscriberImplementation,
    /// Path to transcriber binary (e.g., whisper, whisper-cli)
    pub binary_path: String,
    /// Model name (openai-whisper) or model file path (whisper.cpp)
    pub model: String,
    /// Source language hint, auto-detected when absent
    pub language: Option<String>,
    /// Wall-clock bound for a single transcription
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscriberImplementation {
    /// OpenAI Whisper Python command line (`whisper`)
    OpenaiWhisper,
    /// whisper.cpp command line (`whisper-cli`)
    WhisperCpp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Offset into the video where the probe window starts
    pub window_start_secs: u64,
    /// Length of the probe window
    pub window_duration_secs: u64,
    /// Sample rate of the extracted mono PCM audio
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// How score rows are resolved into an assignment
    pub policy: AssignmentPolicy,
    /// Ignore very frequent characters when seeding matches
    pub autojunk: bool,
    /// Best scores below this leave the video unassigned
    pub min_score: f64,
    /// Extensions (without dot) considered video files
    pub video_extensions: Vec<String>,
    /// Extension (without dot) of subtitle files
    pub subtitle_extension: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentPolicy {
    /// Greedy: every video takes its best episode, a collision aborts the batch
    Greedy,
    /// Optimal: maximum-weight one-to-one matching over all videos and episodes
    Optimal,
}

impl std::fmt::Display for AssignmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignmentPolicy::Greedy => write!(f, "greedy"),
            AssignmentPolicy::Optimal => write!(f, "optimal"),
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            implementation: TranscriberImplementation::OpenaiWhisper,
            binary_path: "whisper".to_string(),
            model: "base".to_string(),
            language: None,
            timeout_secs: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            window_start_secs: 0,
            window_duration_secs: 15 * 60,
            sample_rate: 16000,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            policy: AssignmentPolicy::Greedy,
            autojunk: false,
            min_score: 0.0,
            video_extensions: ["mkv", "mp4", "avi", "mov"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            subtitle_extension: "srt".to_string(),
        }
    }
}

impl TranscriberConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EpisortError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| EpisortError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EpisortError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| EpisortError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.media.window_duration_secs == 0 {
            return Err(EpisortError::Config(
                "media.window_duration_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.matching.min_score) {
            return Err(EpisortError::Config(format!(
                "matching.min_score must be within [0, 1], got {}",
                self.matching.min_score
            )));
        }
        if self.matching.video_extensions.is_empty() {
            return Err(EpisortError::Config(
                "matching.video_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `path` carries one of the configured video extensions
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.matching
                    .video_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
