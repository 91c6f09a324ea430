//! Episort - identify unlabeled TV episode files
//!
//! Entry point: parses the command line, loads configuration, sets up logging
//! and runs the requested command.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use episort::cli::{with_season_suffix, Args, Commands};
use episort::config::{AssignmentPolicy, Config};
use episort::error::EpisortError;
use episort::index::ReferenceTranscriptIndex;
use episort::workflow::{IdentifyRequest, Workflow};

const DEFAULT_CONFIG_FILE: &str = "episort.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    let _log_guard = setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Identify {
            season_number,
            video_input_directory,
            transcript_input_directory,
            output_directory,
            show_name,
            append_season,
            policy,
            window_minutes,
            dry_run,
            report,
        } => {
            if let Some(policy) = policy {
                config.matching.policy = parse_assignment_policy(&policy)?;
            }
            apply_window_minutes(&mut config, window_minutes);

            let (video_dir, transcript_dir, output_dir) = if append_season {
                (
                    with_season_suffix(&video_input_directory, season_number),
                    with_season_suffix(&transcript_input_directory, season_number),
                    with_season_suffix(&output_directory, season_number),
                )
            } else {
                (video_input_directory, transcript_input_directory, output_directory)
            };

            info!(
                "Identifying season {} of {} ({} policy)",
                season_number, show_name, config.matching.policy
            );

            let workflow = Workflow::new(config)?.with_progress(!args.verbose);
            let request = IdentifyRequest {
                season: season_number,
                video_dir,
                transcript_dir,
                output_dir,
                show_name,
                dry_run,
                report_path: report,
            };
            let outcome = workflow.identify(&request).await?;

            println!("\nEpisode assignment:");
            println!("{:<8} {:<8} {:<60}", "Episode", "Score", "Video");
            println!("{}", "-".repeat(78));
            for (episode, assigned) in outcome.resolution.assignment.iter() {
                println!("{:<8} {:<8.4} {:<60}", episode, assigned.score, assigned.video.display());
            }
            for video in &outcome.resolution.unassigned {
                println!("{:<8} {:<8} {:<60}", "-", "-", video.display());
            }

            for failure in &outcome.failures {
                warn!("Not processed: {}: {}", failure.video.display(), failure.error);
            }
            for failed in &outcome.relocation.failed {
                warn!("Not moved: {}: {}", failed.planned.source.display(), failed.error);
            }

            let verb = if outcome.relocation.dry_run { "Would move" } else { "Moved" };
            println!(
                "\n{} {} file(s); {} move(s) failed; {} video(s) could not be processed",
                verb,
                outcome.relocation.moved.len(),
                outcome.relocation.failed.len(),
                outcome.failures.len()
            );
        }
        Commands::Index { transcript_input_directory, season_number } => {
            let index = ReferenceTranscriptIndex::build(
                &transcript_input_directory,
                &config.matching.subtitle_extension,
                season_number,
            )
            .await?;

            println!("\nReference transcripts:");
            println!("{:<8} {:<10} {:<60}", "Episode", "Chars", "Source");
            println!("{}", "-".repeat(80));
            for reference in index.iter() {
                println!(
                    "{:<8} {:<10} {:<60}",
                    reference.episode,
                    reference.text.chars().count(),
                    reference.source.display()
                );
            }
        }
        Commands::Score { video, transcript_input_directory, window_minutes } => {
            apply_window_minutes(&mut config, window_minutes);

            let workflow = Workflow::new(config)?;
            let index = workflow.build_index(&transcript_input_directory, None).await?;
            let row = workflow.score_video(&video, &index).await?;

            println!("\nScores for {}:", row.video.display());
            println!("{:<8} {:<8}", "Episode", "Score");
            println!("{}", "-".repeat(18));
            for (episode, score) in &row.scores {
                let marker = if Some(*episode) == row.best_episode { " <- best" } else { "" };
                println!("{:<8} {:<8.4}{}", episode, score, marker);
            }
        }
    }

    info!("Episort completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".episort").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "episort.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("episort.log").display());

    Ok(guard)
}

fn apply_window_minutes(config: &mut Config, window_minutes: Option<u64>) {
    if let Some(minutes) = window_minutes {
        config.media.window_duration_secs = minutes * 60;
    }
}

/// Parse assignment policy from string
fn parse_assignment_policy(policy: &str) -> Result<AssignmentPolicy> {
    match policy.to_lowercase().as_str() {
        "greedy" => Ok(AssignmentPolicy::Greedy),
        "optimal" => Ok(AssignmentPolicy::Optimal),
        _ => Err(EpisortError::Config(format!(
            "Invalid assignment policy '{}'. Valid policies: greedy, optimal",
            policy
        )).into()),
    }
}
