//! Reference transcript index: episode number to ground-truth transcript,
//! built from the subtitle files of one season.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Result, EpisortError};
use crate::subtitle::read_srt_file;

pub type EpisodeNumber = u32;

/// Season/episode marker such as `S01E02` or `s1e2`
static EPISODE_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)S(\d+)E(\d+)").expect("episode marker pattern is valid"));

/// Season and episode parsed from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    pub season: u32,
    pub episode: EpisodeNumber,
}

impl EpisodeMarker {
    /// Parse the first season/episode marker in `file_name`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = EPISODE_MARKER_RE.captures(file_name)?;
        let season = captures[1].parse().ok()?;
        let episode = captures[2].parse().ok()?;
        Some(Self { season, episode })
    }
}

/// Ground-truth transcript of one episode
#[derive(Debug, Clone)]
pub struct ReferenceTranscript {
    pub episode: EpisodeNumber,
    pub source: PathBuf,
    pub text: String,
}

/// Episode number to reference transcript, iterated in ascending episode order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTranscriptIndex {
    entries: BTreeMap<EpisodeNumber, ReferenceTranscript>,
}

impl ReferenceTranscriptIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transcript. A transcript already stored for the same episode is
    /// replaced and returned.
    pub fn insert(&mut self, transcript: ReferenceTranscript) -> Option<ReferenceTranscript> {
        let previous = self.entries.insert(transcript.episode, transcript);
        if let Some(previous) = &previous {
            let current = &self.entries[&previous.episode];
            warn!(
                "Episode {} already indexed from {}; replacing it with {}",
                previous.episode,
                previous.source.display(),
                current.source.display()
            );
        }
        previous
    }

    pub fn get(&self, episode: EpisodeNumber) -> Option<&ReferenceTranscript> {
        self.entries.get(&episode)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn episodes(&self) -> impl Iterator<Item = EpisodeNumber> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceTranscript> {
        self.entries.values()
    }

    /// Build the index from every subtitle file under `base_dir`.
    ///
    /// Files are visited in file-name order, so when two files claim the same
    /// episode the later one wins. Files without a usable marker, or that
    /// cannot be read, are logged and skipped.
    pub async fn build<P: AsRef<Path>>(
        base_dir: P,
        subtitle_extension: &str,
        expected_season: Option<u32>,
    ) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        info!("Searching for .{} files in: {}", subtitle_extension, base_dir.display());

        if !base_dir.is_dir() {
            return Err(EpisortError::FileNotFound(base_dir.display().to_string()));
        }

        let subtitle_files = discover_files(base_dir, |path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(subtitle_extension))
                .unwrap_or(false)
        });
        info!("Found {} subtitle files", subtitle_files.len());

        let mut index = Self::new();
        for path in subtitle_files {
            match load_reference(&path, expected_season).await {
                Ok(transcript) => {
                    debug!(
                        "Indexed episode {} from {} ({} chars)",
                        transcript.episode,
                        path.display(),
                        transcript.text.chars().count()
                    );
                    index.insert(transcript);
                }
                Err(e) => warn!("Skipping subtitle file: {}", e),
            }
        }

        info!("Reference index holds {} episodes", index.len());
        Ok(index)
    }
}

impl FromIterator<ReferenceTranscript> for ReferenceTranscriptIndex {
    fn from_iter<I: IntoIterator<Item = ReferenceTranscript>>(iter: I) -> Self {
        let mut index = Self::new();
        for transcript in iter {
            index.insert(transcript);
        }
        index
    }
}

async fn load_reference(path: &Path, expected_season: Option<u32>) -> Result<ReferenceTranscript> {
    let parse_error = |message: &str| EpisortError::Parse {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| parse_error("file name is not valid UTF-8"))?;
    let marker = EpisodeMarker::parse(file_name)
        .ok_or_else(|| parse_error("no season/episode marker in file name"))?;

    if marker.episode == 0 {
        return Err(parse_error("episode number must be positive"));
    }
    if let Some(season) = expected_season {
        if marker.season != season {
            warn!(
                "{} is marked season {} but season {} was requested",
                path.display(),
                marker.season,
                season
            );
        }
    }

    let text = read_srt_file(path).await?;
    Ok(ReferenceTranscript {
        episode: marker.episode,
        source: path.to_path_buf(),
        text,
    })
}

/// Recursively list files under `base_dir` accepted by `filter`, sorted by file name.
pub fn discover_files<F>(base_dir: &Path, filter: F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    WalkDir::new(base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cannot read directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && filter(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}
