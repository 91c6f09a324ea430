use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, EpisortError};
use super::{TranscriberTrait, WhisperCppOutput, check_binary, read_json_output, run_transcriber_command};

/// whisper.cpp command line transcriber
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
}

impl WhisperCppTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, audio_path: &Path, output_base: &Path) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-oj")  // Output JSON format
           .arg("-of").arg(output_base)  // Output file base name (without extension)
           .arg("-np")  // No progress or timing prints
           .arg("-m").arg(&self.config.model)
           .arg("-f").arg(audio_path);

        if let Some(lang) = &self.config.language {
            cmd.arg("-l").arg(lang);
        }
        cmd
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!("Transcribing {} with whisper.cpp", audio_path.display());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| EpisortError::Transcriber(format!("Failed to create temp dir: {}", e)))?;
        debug!("Using temp directory: {}", temp_dir.path().display());

        let output_base = temp_dir.path().join("transcript");
        let output_path = temp_dir.path().join("transcript.json");

        let cmd = self.build_command(audio_path, &output_base);
        run_transcriber_command(cmd, self.name()).await?;

        let whisper_output: WhisperCppOutput = read_json_output(&output_path).await?;
        Ok(whisper_output.into_text())
    }

    fn check_availability(&self) -> Result<()> {
        check_binary(&self.config.binary_path, "--help")?;
        if !Path::new(&self.config.model).is_file() {
            return Err(EpisortError::Transcriber(format!(
                "whisper.cpp model file not found: {}",
                self.config.model
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "whisper.cpp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let config = TranscriberConfig {
            binary_path: "whisper-cli".to_string(),
            model: "models/ggml-base.bin".to_string(),
            language: Some("en".to_string()),
            ..TranscriberConfig::default()
        };
        let transcriber = WhisperCppTranscriber::new(config);
        let cmd = transcriber.build_command(Path::new("/tmp/probe.wav"), Path::new("/tmp/out/transcript"));

        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "whisper-cli");
        let args: Vec<String> = std_cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "-oj", "-of", "/tmp/out/transcript", "-np", "-m", "models/ggml-base.bin",
                "-f", "/tmp/probe.wav", "-l", "en",
            ]
        );
    }

    #[test]
    fn test_missing_model_fails_availability() {
        let config = TranscriberConfig {
            binary_path: "sh".to_string(),
            model: "/nonexistent/ggml-base.bin".to_string(),
            ..TranscriberConfig::default()
        };
        let transcriber = WhisperCppTranscriber::new(config);
        assert!(transcriber.check_availability().is_err());
    }
}
