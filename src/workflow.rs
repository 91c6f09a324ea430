use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::assignment::{AssignedVideo, AssignmentResolver, Resolution, ScoreRow};
use crate::config::{AssignmentPolicy, Config};
use crate::error::{Result, EpisortError};
use crate::index::{discover_files, EpisodeNumber, ReferenceTranscriptIndex};
use crate::media::{AudioExtractorFactory, AudioWindow};
use crate::probe::CandidateTranscriber;
use crate::relocate::{RelocationPlan, RelocationReport, Relocator};
use crate::similarity::SimilarityScorer;
use crate::transcribe::TranscriberFactory;

/// Inputs of one identification run
#[derive(Debug, Clone)]
pub struct IdentifyRequest {
    pub season: u32,
    pub video_dir: PathBuf,
    pub transcript_dir: PathBuf,
    pub output_dir: PathBuf,
    pub show_name: String,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

/// A video that could not be probed; the rest of the batch carried on
#[derive(Debug, Clone, Serialize)]
pub struct VideoFailure {
    pub video: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct IdentifyOutcome {
    pub indexed_episodes: usize,
    pub resolution: Resolution,
    pub failures: Vec<VideoFailure>,
    pub plan: RelocationPlan,
    pub relocation: RelocationReport,
}

#[derive(Debug, Serialize)]
struct ReportAssignment<'a> {
    episode: EpisodeNumber,
    #[serde(flatten)]
    assigned: &'a AssignedVideo,
}

/// JSON summary of a run
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    generated_at: DateTime<Utc>,
    show_name: &'a str,
    season: u32,
    policy: AssignmentPolicy,
    indexed_episodes: usize,
    rows: &'a [ScoreRow],
    assignment: Vec<ReportAssignment<'a>>,
    unassigned: &'a [PathBuf],
    failures: &'a [VideoFailure],
    relocation: &'a RelocationReport,
}

pub struct Workflow {
    config: Config,
    prober: CandidateTranscriber,
    scorer: SimilarityScorer,
    show_progress: bool,
}

impl Workflow {
    /// Build the workflow with the configured external tools and check they run
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let extractor = AudioExtractorFactory::create_extractor(config.media.clone());
        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone());
        let prober = CandidateTranscriber::new(
            extractor,
            transcriber,
            AudioWindow::from_config(&config.media),
            config.transcriber.timeout(),
        );

        // Check dependencies
        prober.check_availability()?;

        Ok(Self::with_prober(config, prober))
    }

    /// Build the workflow around an existing prober
    pub fn with_prober(config: Config, prober: CandidateTranscriber) -> Self {
        let scorer = SimilarityScorer::new(config.matching.autojunk);
        Self {
            config,
            prober,
            scorer,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Build the reference transcript index for a season
    pub async fn build_index<P: AsRef<Path>>(
        &self,
        transcript_dir: P,
        season: Option<u32>,
    ) -> Result<ReferenceTranscriptIndex> {
        ReferenceTranscriptIndex::build(
            transcript_dir,
            &self.config.matching.subtitle_extension,
            season,
        )
        .await
    }

    /// Video files under `video_dir`, in file-name order
    pub fn discover_videos<P: AsRef<Path>>(&self, video_dir: P) -> Result<Vec<PathBuf>> {
        let video_dir = video_dir.as_ref();
        info!("Searching for video files in: {}", video_dir.display());

        if !video_dir.is_dir() {
            return Err(EpisortError::FileNotFound(video_dir.display().to_string()));
        }

        let videos = discover_files(video_dir, |path| self.config.is_video_file(path));
        info!("Found {} video files", videos.len());
        Ok(videos)
    }

    /// Probe one video and score it against every indexed episode
    pub async fn score_video<P: AsRef<Path>>(
        &self,
        video_path: P,
        index: &ReferenceTranscriptIndex,
    ) -> Result<ScoreRow> {
        let candidate = self.prober.probe(video_path).await?;
        Ok(ScoreRow::compute(&candidate, index, &self.scorer))
    }

    /// Identify every video of a season and move it to its episode name
    pub async fn identify(&self, request: &IdentifyRequest) -> Result<IdentifyOutcome> {
        let index = self.build_index(&request.transcript_dir, Some(request.season)).await?;
        if index.is_empty() {
            return Err(EpisortError::FileNotFound(format!(
                "no subtitle files with a season/episode marker under {}",
                request.transcript_dir.display()
            )));
        }

        let videos = self.discover_videos(&request.video_dir)?;
        let mut resolver = AssignmentResolver::new(
            self.config.matching.policy,
            self.config.matching.min_score,
        );
        let mut failures = Vec::new();

        let pb = self.progress_bar(videos.len() as u64);
        for video in &videos {
            pb.set_message(
                video
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );

            match self.score_video(video, &index).await {
                Ok(row) => resolver.push(row)?,
                Err(e) if !e.is_batch_fatal() => {
                    warn!("Skipping {}: {}", video.display(), e);
                    failures.push(VideoFailure {
                        video: video.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
            pb.inc(1);
        }
        pb.finish_with_message("done");

        let resolution = resolver.finish()?;
        let plan = RelocationPlan::from_assignment(
            &resolution.assignment,
            &request.output_dir,
            &request.show_name,
            request.season,
        );
        let relocation = Relocator::new(request.dry_run).apply(&plan).await;

        let outcome = IdentifyOutcome {
            indexed_episodes: index.len(),
            resolution,
            failures,
            plan,
            relocation,
        };

        if let Some(report_path) = &request.report_path {
            self.write_report(request, &outcome, report_path).await?;
        }

        Ok(outcome)
    }

    async fn write_report(
        &self,
        request: &IdentifyRequest,
        outcome: &IdentifyOutcome,
        report_path: &Path,
    ) -> Result<()> {
        let report = RunReport {
            generated_at: Utc::now(),
            show_name: &request.show_name,
            season: request.season,
            policy: self.config.matching.policy,
            indexed_episodes: outcome.indexed_episodes,
            rows: &outcome.resolution.rows,
            assignment: outcome
                .resolution
                .assignment
                .iter()
                .map(|(episode, assigned)| ReportAssignment { episode, assigned })
                .collect(),
            unassigned: &outcome.resolution.unassigned,
            failures: &outcome.failures,
            relocation: &outcome.relocation,
        };

        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(report_path, serde_json::to_string_pretty(&report)?).await?;
        info!("Report written to {}", report_path.display());
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        let pb = ProgressBar::new(len);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
