use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, EpisortError};
use super::AudioWindow;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Only print errors
    pub fn quiet(self) -> Self {
        self.arg("-hide_banner").arg("-loglevel").arg("error")
    }

    /// Seek the next input to `offset`
    pub fn seek(self, offset: Duration) -> Self {
        self.arg("-ss").arg(format_seconds(offset))
    }

    /// Limit the next input to `duration`
    pub fn limit_duration(self, duration: Duration) -> Self {
        self.arg("-t").arg(format_seconds(duration))
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Disable subtitle streams
    pub fn no_subtitles(self) -> Self {
        self.arg("-sn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EpisortError::Media(format!("Failed to execute media processor: {}", e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", self.description, stderr.trim());
        }

        if !output.status.success() {
            return Err(EpisortError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

/// Builder for the media processing operations the probe needs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build windowed audio extraction command (mono 16-bit PCM WAV)
    pub fn extract_audio_window<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        window: AudioWindow,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .quiet()
            .seek(window.start)
            .limit_duration(window.duration)
            .input(video_path)
            .no_video()
            .no_subtitles()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(window.sample_rate)
            .audio_channels(1)
            .arg("-f").arg("wav")
            .overwrite()
            .output(audio_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_window_args() {
        let window = AudioWindow {
            start: Duration::from_secs(30),
            duration: Duration::from_secs(900),
            sample_rate: 16000,
        };
        let cmd = MediaCommandBuilder::new("ffmpeg")
            .extract_audio_window(Path::new("/in/clip.mkv"), Path::new("/tmp/probe.wav"), window);

        assert_eq!(cmd.binary_path, "ffmpeg");
        let args = cmd.args.join(" ");
        assert!(args.contains("-ss 30.000 -t 900.000 -i /in/clip.mkv"));
        assert!(args.contains("-c:a pcm_s16le"));
        assert!(args.contains("-ar 16000"));
        assert!(args.contains("-ac 1"));
        assert_eq!(cmd.args.last().map(String::as_str), Some("/tmp/probe.wav"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let cmd = MediaCommand::new("episort-no-such-binary", "Version check").arg("-version");
        let err = cmd.execute().await.unwrap_err();
        assert!(matches!(err, EpisortError::Media(_)));
    }
}
