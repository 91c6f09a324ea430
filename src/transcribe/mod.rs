// Speech-to-text
//
// Transcribers are external command line tools driven through a common trait:
// - OpenAI: OpenAI Whisper Python command line (`whisper`)
// - WhisperCpp: whisper.cpp command line (`whisper-cli`)
//
// Each implementation runs its tool into a scratch directory, parses the JSON
// it writes there and returns the flat transcript text.

pub mod common;
pub mod whisper_cpp;
pub mod openai;

use async_trait::async_trait;
use std::path::Path;

pub use common::*;
pub use crate::config::TranscriberImplementation;
use crate::config::TranscriberConfig;
use crate::error::Result;

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Transcribe an audio file to flat text. Silence may yield an empty string.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;

    /// Check if the transcriber binary is available
    fn check_availability(&self) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the transcriber selected in the configuration
    pub fn create_transcriber(config: TranscriberConfig) -> Box<dyn TranscriberTrait> {
        match config.implementation {
            TranscriberImplementation::WhisperCpp => {
                Box::new(whisper_cpp::WhisperCppTranscriber::new(config))
            }
            TranscriberImplementation::OpenaiWhisper => {
                Box::new(openai::OpenAITranscriber::new(config))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_honours_implementation() {
        let mut config = TranscriberConfig::default();
        assert_eq!(TranscriberFactory::create_transcriber(config.clone()).name(), "openai-whisper");

        config.implementation = TranscriberImplementation::WhisperCpp;
        assert_eq!(TranscriberFactory::create_transcriber(config).name(), "whisper.cpp");
    }
}
