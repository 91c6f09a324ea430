use std::path::PathBuf;
use thiserror::Error;

use crate::index::EpisodeNumber;

#[derive(Error, Debug)]
pub enum EpisortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Transcriber error: {0}")]
    Transcriber(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Cannot parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Audio extraction failed for {}: {message}", .path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("Transcription failed for {}: {message}", .path.display())]
    Transcription { path: PathBuf, message: String },

    #[error(
        "Duplicate entry found for episode {episode}: {} and {} both match it best",
        .existing.display(),
        .contender.display()
    )]
    DuplicateAssignment {
        episode: EpisodeNumber,
        existing: PathBuf,
        contender: PathBuf,
    },

    #[error("Relocation failed for {}: {message}", .path.display())]
    Relocation { path: PathBuf, message: String },
}

impl EpisortError {
    /// Whether this error aborts the whole batch rather than a single video.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(
            self,
            EpisortError::Parse { .. }
                | EpisortError::Extraction { .. }
                | EpisortError::Transcription { .. }
                | EpisortError::Relocation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EpisortError>;
