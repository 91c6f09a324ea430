use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, EpisortError};

/// whisper.cpp JSON output (`-oj`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    pub result: Option<WhisperCppResult>,
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub text: String,
}

impl WhisperCppOutput {
    /// Segment texts joined into one line
    pub fn into_text(self) -> String {
        self.transcription
            .iter()
            .map(|seg| seg.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// OpenAI Whisper JSON output (`--output_format json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    pub text: String,
    pub language: Option<String>,
}

/// Run a transcriber command to completion, failing on a non-zero exit
pub async fn run_transcriber_command(mut cmd: Command, name: &str) -> Result<Output> {
    debug!("Executing {} command: {:?}", name, cmd);

    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| EpisortError::Transcriber(format!("Failed to execute {}: {}", name, e)))?;

    debug!("{} exit status: {}", name, output.status);
    debug!("{} stdout: {}", name, String::from_utf8_lossy(&output.stdout));
    debug!("{} stderr: {}", name, String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EpisortError::Transcriber(format!("{} failed: {}", name, stderr.trim())));
    }

    Ok(output)
}

/// Read and parse the JSON file a transcriber wrote
pub async fn read_json_output<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_content = tokio::fs::read_to_string(path).await
        .map_err(|e| EpisortError::Transcriber(format!("Failed to read transcription {}: {}", path.display(), e)))?;

    serde_json::from_str(&json_content)
        .map_err(|e| EpisortError::Transcriber(format!("Failed to parse transcription JSON: {}", e)))
}

/// Check that `binary` can be spawned with `probe_arg`
pub fn check_binary(binary: &str, probe_arg: &str) -> Result<()> {
    std::process::Command::new(binary)
        .arg(probe_arg)
        .output()
        .map(|_| ())
        .map_err(|e| EpisortError::Transcriber(format!("{} not found: {}", binary, e)))
}
