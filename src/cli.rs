use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify every video of a season and move it to its episode name
    Identify {
        /// Season number
        #[arg(long)]
        season_number: u32,

        /// Directory containing the unlabeled video files
        #[arg(long)]
        video_input_directory: PathBuf,

        /// Directory containing the episode subtitle files
        #[arg(long)]
        transcript_input_directory: PathBuf,

        /// Directory the renamed episodes are moved to
        #[arg(long)]
        output_directory: PathBuf,

        /// Show name used in the new file names
        #[arg(long)]
        show_name: String,

        /// Append the season number to each directory argument
        #[arg(long)]
        append_season: bool,

        /// Assignment policy (greedy, optimal)
        #[arg(long)]
        policy: Option<String>,

        /// Minutes of audio transcribed from the start of each video
        #[arg(long)]
        window_minutes: Option<u64>,

        /// Compute the plan without moving any file
        #[arg(long)]
        dry_run: bool,

        /// Write a JSON report of all scores and moves
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Build the reference transcript index and list it
    Index {
        /// Directory containing the episode subtitle files
        #[arg(long)]
        transcript_input_directory: PathBuf,

        /// Season the subtitle files should belong to
        #[arg(long)]
        season_number: Option<u32>,
    },

    /// Transcribe one video and score it against the reference transcripts
    Score {
        /// Video file to probe
        #[arg(short, long)]
        video: PathBuf,

        /// Directory containing the episode subtitle files
        #[arg(long)]
        transcript_input_directory: PathBuf,

        /// Minutes of audio transcribed from the start of the video
        #[arg(long)]
        window_minutes: Option<u64>,
    },
}

/// `dir` with the season number appended to its last component
pub fn with_season_suffix(dir: &Path, season: u32) -> PathBuf {
    let mut raw = dir.as_os_str().to_os_string();
    raw.push(season.to_string());
    PathBuf::from(raw)
}
