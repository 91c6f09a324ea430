//! Episort - identify unlabeled TV episode files
//!
//! Transcribes the opening minutes of every video, compares the text with
//! subtitle transcripts of the season and renames each video after the
//! episode it matches.

pub mod cli;
pub mod config;
pub mod error;
pub mod subtitle;
pub mod index;
pub mod media;
pub mod transcribe;
pub mod probe;
pub mod similarity;
pub mod assignment;
pub mod relocate;
pub mod workflow;
