//! Transcript normalisation.
//!
//! Subtitle files and transcriber output both end up as one flat string so
//! they can be compared character by character.

use std::path::Path;
use tracing::debug;

use crate::error::{Result, EpisortError};

/// Lines in a well-formed cue before the caption text starts
/// (sequence number, timing line).
const CUE_HEADER_LINES: usize = 2;

/// Flatten the text of an SRT file into a single transcript string.
///
/// Cues are separated by blank lines. Each cue's first two lines (sequence
/// number and timing) are dropped and the remaining caption lines are joined
/// with single spaces. Cues without at least one caption line are skipped.
pub fn normalize_srt(content: &str) -> String {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let content = content.replace("\r\n", "\n").replace('\r', "\n");

    let mut captions: Vec<&str> = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            push_cue(&mut captions, &block);
            block.clear();
        } else {
            block.push(line);
        }
    }
    push_cue(&mut captions, &block);

    captions.join(" ").trim().to_string()
}

fn push_cue<'a>(captions: &mut Vec<&'a str>, block: &[&'a str]) {
    if block.len() > CUE_HEADER_LINES {
        captions.extend_from_slice(&block[CUE_HEADER_LINES..]);
    } else if !block.is_empty() {
        debug!("Skipping malformed cue with {} line(s)", block.len());
    }
}

/// Transcriber output is already a flat string and is passed through as is.
pub fn normalize_transcript(text: &str) -> String {
    text.to_string()
}

/// Read and normalise a subtitle file.
///
/// Invalid UTF-8 is replaced rather than rejected; a file that cannot be read
/// at all is a parse error for that file only.
pub async fn read_srt_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| EpisortError::Parse {
        path: path.to_path_buf(),
        message: format!("failed to read subtitle file: {}", e),
    })?;

    Ok(normalize_srt(&String::from_utf8_lossy(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello there.\n\n2\n00:00:03,000 --> 00:00:05,000\nGeneral Kenobi.\nYou are a bold one.\n";

    #[test]
    fn test_well_formed_cues_are_space_joined() {
        assert_eq!(
            normalize_srt(SAMPLE),
            "Hello there. General Kenobi. You are a bold one."
        );
    }

    #[test]
    fn test_short_cues_contribute_nothing() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\n\n7\n\n2\n00:00:03,000 --> 00:00:04,000\nKept line\n";
        assert_eq!(normalize_srt(content), "Kept line");
    }

    #[test]
    fn test_crlf_and_bom_are_handled() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nFirst\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nSecond\r\n";
        assert_eq!(normalize_srt(content), "First Second");
    }

    #[test]
    fn test_extra_blank_lines_between_cues() {
        let content = "\n\n1\n00:00:01,000 --> 00:00:02,000\nOne\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\n\n\n";
        assert_eq!(normalize_srt(content), "One Two");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_srt(""), "");
        assert_eq!(normalize_srt("\n\n\n"), "");
    }

    #[test]
    fn test_transcript_passes_through() {
        assert_eq!(normalize_transcript(" a cat sat"), " a cat sat");
    }

    #[tokio::test]
    async fn test_read_srt_file_missing_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_srt_file(dir.path().join("missing.srt")).await.unwrap_err();
        assert!(matches!(err, EpisortError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_read_srt_file_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Show.S01E01.srt");
        let mut bytes = b"1\n00:00:01,000 --> 00:00:02,000\ncaf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b" time\n");
        std::fs::write(&path, bytes).unwrap();

        let transcript = read_srt_file(&path).await.unwrap();
        assert!(transcript.starts_with("caf"));
        assert!(transcript.ends_with(" time"));
    }
}
