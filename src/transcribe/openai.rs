// OpenAI Whisper Python implementation

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

use crate::config::TranscriberConfig;
use crate::error::{Result, EpisortError};
use super::{OpenAIWhisperOutput, TranscriberTrait, check_binary, read_json_output, run_transcriber_command};

/// OpenAI Whisper implementation
pub struct OpenAITranscriber {
    config: TranscriberConfig,
}

impl OpenAITranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, audio_path: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model").arg(&self.config.model)
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json")
            .arg("--verbose").arg("False");

        if let Some(lang) = &self.config.language {
            cmd.arg("--language").arg(lang);
        }
        cmd
    }
}

#[async_trait]
impl TranscriberTrait for OpenAITranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing {} with OpenAI Whisper ({})", audio_path.display(), self.config.model);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| EpisortError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let cmd = self.build_command(audio_path, output_dir);
        run_transcriber_command(cmd, self.name()).await?;

        // whisper names its output after the input file
        let audio_filename = audio_path.file_stem()
            .ok_or_else(|| EpisortError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_filename.to_string_lossy()));

        let whisper_output: OpenAIWhisperOutput = read_json_output(&json_file).await?;
        Ok(whisper_output.text)
    }

    fn check_availability(&self) -> Result<()> {
        check_binary(&self.config.binary_path, "--help")
    }

    fn name(&self) -> &'static str {
        "openai-whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_without_language() {
        let transcriber = OpenAITranscriber::new(TranscriberConfig::default());
        let cmd = transcriber.build_command(Path::new("/tmp/probe.wav"), Path::new("/tmp/out"));

        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "/tmp/probe.wav", "--model", "base", "--output_dir", "/tmp/out",
                "--output_format", "json", "--verbose", "False",
            ]
        );
    }
}
