//! Moving identified videos to their final names.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::assignment::Assignment;
use crate::error::{Result, EpisortError};
use crate::index::EpisodeNumber;

/// Destination for an identified episode:
/// `<output_dir>/<show_name>-S<season>E<episode><ext>`.
///
/// Numbers are not zero-padded; the extension keeps its original spelling.
pub fn destination_path(
    output_dir: &Path,
    show_name: &str,
    season: u32,
    episode: EpisodeNumber,
    source: &Path,
) -> PathBuf {
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    output_dir.join(format!("{}-S{}E{}{}", show_name, season, episode, extension))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMove {
    pub episode: EpisodeNumber,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Every move implied by an assignment, in episode order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationPlan {
    pub moves: Vec<PlannedMove>,
}

impl RelocationPlan {
    pub fn from_assignment(
        assignment: &Assignment,
        output_dir: &Path,
        show_name: &str,
        season: u32,
    ) -> Self {
        let moves = assignment
            .iter()
            .map(|(episode, assigned)| PlannedMove {
                episode,
                source: assigned.video.clone(),
                destination: destination_path(output_dir, show_name, season, episode, &assigned.video),
            })
            .collect();
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedMove {
    pub planned: PlannedMove,
    pub error: String,
}

/// Outcome of applying a plan; some moves may fail while others succeed
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationReport {
    pub moved: Vec<PlannedMove>,
    pub failed: Vec<FailedMove>,
    pub dry_run: bool,
}

pub struct Relocator {
    dry_run: bool,
}

impl Relocator {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Apply every move in the plan. A failed move is recorded and the rest
    /// still run.
    pub async fn apply(&self, plan: &RelocationPlan) -> RelocationReport {
        let mut report = RelocationReport {
            dry_run: self.dry_run,
            ..RelocationReport::default()
        };

        for planned in &plan.moves {
            if self.dry_run {
                info!(
                    "[dry run] {} -> {}",
                    planned.source.display(),
                    planned.destination.display()
                );
                report.moved.push(planned.clone());
                continue;
            }

            match move_file(&planned.source, &planned.destination).await {
                Ok(()) => {
                    info!(
                        "Moved episode {}: {} -> {}",
                        planned.episode,
                        planned.source.display(),
                        planned.destination.display()
                    );
                    report.moved.push(planned.clone());
                }
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push(FailedMove {
                        planned: planned.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Move `source` to `destination`, creating parent directories.
///
/// An existing destination is never overwritten. When a rename is not
/// possible the file is copied and the source removed; a partial copy is
/// cleaned up.
pub async fn move_file(source: &Path, destination: &Path) -> Result<()> {
    let relocation_error = |message: String| EpisortError::Relocation {
        path: source.to_path_buf(),
        message,
    };

    if !fs::try_exists(source).await.unwrap_or(false) {
        return Err(relocation_error("source file does not exist".to_string()));
    }
    if fs::try_exists(destination).await.unwrap_or(false) {
        return Err(relocation_error(format!(
            "destination {} already exists",
            destination.display()
        )));
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            relocation_error(format!("cannot create {}: {}", parent.display(), e))
        })?;
    }

    if fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }

    if let Err(e) = fs::copy(source, destination).await {
        let _ = fs::remove_file(destination).await;
        return Err(relocation_error(format!(
            "cannot copy to {}: {}",
            destination.display(),
            e
        )));
    }
    fs::remove_file(source).await.map_err(|e| {
        relocation_error(format!("copied to {} but cannot remove source: {}", destination.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_destination_naming() {
        let dest = destination_path(
            Path::new("/out"),
            "Foo",
            2,
            3,
            Path::new("/tmp/clip.mkv"),
        );
        assert_eq!(dest, PathBuf::from("/out/Foo-S2E3.mkv"));

        let dest = destination_path(Path::new("/out"), "Foo", 10, 12, Path::new("/tmp/raw"));
        assert_eq!(dest, PathBuf::from("/out/Foo-S10E12"));
    }

    #[tokio::test]
    async fn test_apply_moves_file() {
        let input = assert_fs::TempDir::new().unwrap();
        let output = assert_fs::TempDir::new().unwrap();
        let clip = input.child("clip.mkv");
        clip.write_str("video bytes").unwrap();

        let mut assignment = Assignment::new();
        assignment.insert(3, clip.path().to_path_buf(), 0.9).unwrap();
        let out_dir = output.path().join("Season2");
        let plan = RelocationPlan::from_assignment(&assignment, &out_dir, "Foo", 2);

        let report = Relocator::new(false).apply(&plan).await;

        let expected = out_dir.join("Foo-S2E3.mkv");
        assert_eq!(plan.moves[0].destination, expected);
        assert_eq!(report.moved.len(), 1);
        assert!(report.failed.is_empty());
        assert!(!clip.path().exists());
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), "video bytes");
    }

    #[tokio::test]
    async fn test_apply_is_partial_success() {
        let input = assert_fs::TempDir::new().unwrap();
        let output = assert_fs::TempDir::new().unwrap();
        let present = input.child("present.mp4");
        present.write_str("a").unwrap();

        let mut assignment = Assignment::new();
        assignment.insert(1, input.path().join("vanished.mkv"), 0.8).unwrap();
        assignment.insert(2, present.path().to_path_buf(), 0.7).unwrap();
        let plan = RelocationPlan::from_assignment(&assignment, output.path(), "Show", 1);

        let report = Relocator::new(false).apply(&plan).await;

        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.moved[0].episode, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].planned.episode, 1);
        assert!(output.path().join("Show-S1E2.mp4").exists());
    }

    #[tokio::test]
    async fn test_existing_destination_is_not_overwritten() {
        let temp = assert_fs::TempDir::new().unwrap();
        let source = temp.child("new.mkv");
        source.write_str("new").unwrap();
        let destination = temp.child("out/Show-S1E1.mkv");
        destination.write_str("old").unwrap();

        let err = move_file(source.path(), destination.path()).await.unwrap_err();
        assert!(matches!(err, EpisortError::Relocation { .. }));
        assert!(source.path().exists());
        assert_eq!(std::fs::read_to_string(destination.path()).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let clip = temp.child("clip.avi");
        clip.write_str("x").unwrap();

        let mut assignment = Assignment::new();
        assignment.insert(4, clip.path().to_path_buf(), 0.5).unwrap();
        let plan = RelocationPlan::from_assignment(&assignment, &temp.path().join("out"), "Show", 1);

        let report = Relocator::new(true).apply(&plan).await;
        assert!(report.dry_run);
        assert_eq!(report.moved.len(), 1);
        assert!(clip.path().exists());
        assert!(!temp.path().join("out").exists());
    }
}
