//! Score rows and their resolution into a video-per-episode assignment.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::AssignmentPolicy;
use crate::error::{Result, EpisortError};
use crate::index::{EpisodeNumber, ReferenceTranscriptIndex};
use crate::probe::VideoCandidate;
use crate::similarity::SimilarityScorer;

/// Similarity of one video against every indexed episode
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRow {
    pub video: PathBuf,
    pub scores: BTreeMap<EpisodeNumber, f64>,
    pub best_episode: Option<EpisodeNumber>,
    pub best_score: f64,
}

impl ScoreRow {
    /// Score `candidate` against every entry of `index`.
    ///
    /// The best episode is the first one, in ascending episode order, whose
    /// score is strictly above every earlier score and above zero.
    pub fn compute(
        candidate: &VideoCandidate,
        index: &ReferenceTranscriptIndex,
        scorer: &SimilarityScorer,
    ) -> Self {
        let scores = index
            .iter()
            .map(|reference| {
                let score = scorer.score(&candidate.probe_transcript, &reference.text);
                debug!(
                    "{} vs episode {}: {:.4}",
                    candidate.path.display(),
                    reference.episode,
                    score
                );
                (reference.episode, score)
            })
            .collect();

        Self::from_scores(candidate.path.clone(), scores)
    }

    pub fn from_scores(video: PathBuf, scores: BTreeMap<EpisodeNumber, f64>) -> Self {
        let mut best_episode = None;
        let mut best_score = 0.0;
        for (&episode, &score) in &scores {
            if score > best_score {
                best_episode = Some(episode);
                best_score = score;
            }
        }

        Self {
            video,
            scores,
            best_episode,
            best_score,
        }
    }

    pub fn score_for(&self, episode: EpisodeNumber) -> Option<f64> {
        self.scores.get(&episode).copied()
    }
}

/// The video chosen for one episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedVideo {
    pub video: PathBuf,
    pub score: f64,
}

/// Episode number to the video identified as that episode
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assignment {
    entries: BTreeMap<EpisodeNumber, AssignedVideo>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `episode` for `video`; an episode can only be claimed once.
    pub fn insert(&mut self, episode: EpisodeNumber, video: PathBuf, score: f64) -> Result<()> {
        if let Some(existing) = self.entries.get(&episode) {
            return Err(EpisortError::DuplicateAssignment {
                episode,
                existing: existing.video.clone(),
                contender: video,
            });
        }
        self.entries.insert(episode, AssignedVideo { video, score });
        Ok(())
    }

    pub fn get(&self, episode: EpisodeNumber) -> Option<&AssignedVideo> {
        self.entries.get(&episode)
    }

    pub fn episode_of(&self, video: &Path) -> Option<EpisodeNumber> {
        self.entries
            .iter()
            .find(|(_, assigned)| assigned.video == video)
            .map(|(&episode, _)| episode)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EpisodeNumber, &AssignedVideo)> {
        self.entries.iter().map(|(&episode, assigned)| (episode, assigned))
    }
}

/// Final outcome of resolving all score rows
#[derive(Debug, Clone)]
pub struct Resolution {
    pub assignment: Assignment,
    pub rows: Vec<ScoreRow>,
    /// Videos left without an episode (no match, or score below the floor)
    pub unassigned: Vec<PathBuf>,
}

/// Folds score rows, one at a time in discovery order, into an assignment.
pub struct AssignmentResolver {
    policy: AssignmentPolicy,
    min_score: f64,
    assignment: Assignment,
    rows: Vec<ScoreRow>,
    unassigned: Vec<PathBuf>,
}

impl AssignmentResolver {
    pub fn new(policy: AssignmentPolicy, min_score: f64) -> Self {
        Self {
            policy,
            min_score,
            assignment: Assignment::new(),
            rows: Vec::new(),
            unassigned: Vec::new(),
        }
    }

    pub fn policy(&self) -> AssignmentPolicy {
        self.policy
    }

    /// Accept the next score row.
    ///
    /// Under the greedy policy the row's best episode is claimed immediately
    /// and a collision fails the whole batch.
    pub fn push(&mut self, row: ScoreRow) -> Result<()> {
        if self.policy == AssignmentPolicy::Greedy {
            match row.best_episode {
                Some(episode) if row.best_score >= self.min_score => {
                    info!(
                        "{} best matches episode {} ({:.4})",
                        row.video.display(),
                        episode,
                        row.best_score
                    );
                    self.assignment.insert(episode, row.video.clone(), row.best_score)?;
                }
                Some(episode) => {
                    warn!(
                        "{} best matches episode {} with only {:.4}, below the {:.4} floor",
                        row.video.display(),
                        episode,
                        row.best_score,
                        self.min_score
                    );
                    self.unassigned.push(row.video.clone());
                }
                None => {
                    warn!("{} matches no episode", row.video.display());
                    self.unassigned.push(row.video.clone());
                }
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Finish resolution and hand over the assignment.
    pub fn finish(mut self) -> Result<Resolution> {
        if self.policy == AssignmentPolicy::Optimal {
            let (assignment, unassigned) = optimal_assignment(&self.rows, self.min_score)?;
            self.assignment = assignment;
            self.unassigned = unassigned;
        }

        info!(
            "Assigned {} of {} videos ({} policy)",
            self.assignment.len(),
            self.rows.len(),
            self.policy
        );
        Ok(Resolution {
            assignment: self.assignment,
            rows: self.rows,
            unassigned: self.unassigned,
        })
    }
}

/// Resolve all rows at once with a maximum-weight one-to-one matching.
fn optimal_assignment(rows: &[ScoreRow], min_score: f64) -> Result<(Assignment, Vec<PathBuf>)> {
    let episodes: Vec<EpisodeNumber> = rows
        .iter()
        .flat_map(|row| row.scores.keys().copied())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let weights: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            episodes
                .iter()
                .map(|&episode| row.score_for(episode).unwrap_or(0.0))
                .collect()
        })
        .collect();

    let pairs = max_weight_matching(&weights);

    let mut assignment = Assignment::new();
    let mut matched = vec![false; rows.len()];
    for (row_idx, col_idx) in pairs {
        let row = &rows[row_idx];
        let score = weights[row_idx][col_idx];
        if score <= 0.0 || score < min_score {
            continue;
        }
        let episode = episodes[col_idx];
        if row.best_episode != Some(episode) {
            info!(
                "{} assigned to episode {} ({:.4}) instead of its best match {:?}",
                row.video.display(),
                episode,
                score,
                row.best_episode
            );
        }
        assignment.insert(episode, row.video.clone(), score)?;
        matched[row_idx] = true;
    }

    let unassigned = rows
        .iter()
        .zip(&matched)
        .filter(|(_, matched)| !**matched)
        .map(|(row, _)| {
            warn!("{} left without an episode", row.video.display());
            row.video.clone()
        })
        .collect();

    Ok((assignment, unassigned))
}

/// Maximum-weight assignment on a rectangular matrix (Kuhn-Munkres).
///
/// Returns `(row, column)` pairs; every row is matched when there are at
/// least as many columns as rows, and vice versa.
pub fn max_weight_matching(weights: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let rows = weights.len();
    let cols = weights.first().map(Vec::len).unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }

    if rows > cols {
        let transposed: Vec<Vec<f64>> = (0..cols)
            .map(|c| (0..rows).map(|r| weights[r][c]).collect())
            .collect();
        return max_weight_matching(&transposed)
            .into_iter()
            .map(|(c, r)| (r, c))
            .collect();
    }

    // Minimise cost = max - weight; 1-based potentials, column 0 is the sentinel.
    let max = weights
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let cost = |r: usize, c: usize| max - weights[r - 1][c - 1];

    let mut u = vec![0.0; rows + 1];
    let mut v = vec![0.0; cols + 1];
    let mut owner = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for r in 1..=rows {
        owner[0] = r;
        let mut col = 0usize;
        let mut min_slack = vec![f64::INFINITY; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[col] = true;
            let row = owner[col];
            let mut delta = f64::INFINITY;
            let mut next_col = 0usize;
            for c in 1..=cols {
                if used[c] {
                    continue;
                }
                let slack = cost(row, c) - u[row] - v[c];
                if slack < min_slack[c] {
                    min_slack[c] = slack;
                    way[c] = col;
                }
                if min_slack[c] < delta {
                    delta = min_slack[c];
                    next_col = c;
                }
            }
            for c in 0..=cols {
                if used[c] {
                    u[owner[c]] += delta;
                    v[c] -= delta;
                } else {
                    min_slack[c] -= delta;
                }
            }
            col = next_col;
            if owner[col] == 0 {
                break;
            }
        }

        loop {
            let prev = way[col];
            owner[col] = owner[prev];
            col = prev;
            if col == 0 {
                break;
            }
        }
    }

    (1..=cols)
        .filter(|&c| owner[c] != 0)
        .map(|c| (owner[c] - 1, c - 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ReferenceTranscript;

    fn row(video: &str, scores: &[(EpisodeNumber, f64)]) -> ScoreRow {
        ScoreRow::from_scores(PathBuf::from(video), scores.iter().copied().collect())
    }

    fn index(entries: &[(EpisodeNumber, &str)]) -> ReferenceTranscriptIndex {
        entries
            .iter()
            .map(|(episode, text)| ReferenceTranscript {
                episode: *episode,
                source: PathBuf::from(format!("Show.S01E{:02}.srt", episode)),
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_best_episode_prefers_first_on_tie() {
        let r = row("a.mkv", &[(1, 0.4), (2, 0.7), (3, 0.7)]);
        assert_eq!(r.best_episode, Some(2));
        assert_eq!(r.best_score, 0.7);
    }

    #[test]
    fn test_all_zero_scores_have_no_best_episode() {
        let r = row("silent.mkv", &[(1, 0.0), (2, 0.0)]);
        assert_eq!(r.best_episode, None);
        assert_eq!(row("none.mkv", &[]).best_episode, None);
    }

    #[test]
    fn test_greedy_assigns_distinct_best_matches() {
        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Greedy, 0.0);
        resolver.push(row("x.mkv", &[(1, 0.9), (2, 0.1), (3, 0.2)])).unwrap();
        resolver.push(row("y.mkv", &[(1, 0.2), (2, 0.1), (3, 0.8)])).unwrap();
        resolver.push(row("z.mkv", &[(1, 0.3), (2, 0.6), (3, 0.2)])).unwrap();

        let resolution = resolver.finish().unwrap();
        let assignment = &resolution.assignment;
        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.get(1).unwrap().video, PathBuf::from("x.mkv"));
        assert_eq!(assignment.get(2).unwrap().video, PathBuf::from("z.mkv"));
        assert_eq!(assignment.get(3).unwrap().video, PathBuf::from("y.mkv"));
        assert!(resolution.unassigned.is_empty());
    }

    #[test]
    fn test_greedy_collision_is_duplicate_error() {
        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Greedy, 0.0);
        resolver.push(row("first.mkv", &[(1, 0.9), (2, 0.1)])).unwrap();
        let err = resolver.push(row("second.mkv", &[(1, 0.8), (2, 0.7)])).unwrap_err();

        match err {
            EpisortError::DuplicateAssignment { episode, existing, contender } => {
                assert_eq!(episode, 1);
                assert_eq!(existing, PathBuf::from("first.mkv"));
                assert_eq!(contender, PathBuf::from("second.mkv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_greedy_leaves_weak_and_empty_matches_unassigned() {
        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Greedy, 0.3);
        resolver.push(row("weak.mkv", &[(1, 0.2)])).unwrap();
        resolver.push(row("silent.mkv", &[(1, 0.0)])).unwrap();
        resolver.push(row("good.mkv", &[(1, 0.6)])).unwrap();

        let resolution = resolver.finish().unwrap();
        assert_eq!(resolution.assignment.len(), 1);
        assert_eq!(resolution.assignment.episode_of(Path::new("good.mkv")), Some(1));
        assert_eq!(
            resolution.unassigned,
            vec![PathBuf::from("weak.mkv"), PathBuf::from("silent.mkv")]
        );
        assert_eq!(resolution.rows.len(), 3);
    }

    #[test]
    fn test_optimal_resolves_collision() {
        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Optimal, 0.0);
        resolver.push(row("recap.mkv", &[(1, 0.9), (2, 0.85)])).unwrap();
        resolver.push(row("pilot.mkv", &[(1, 0.95), (2, 0.3)])).unwrap();

        let resolution = resolver.finish().unwrap();
        assert_eq!(resolution.assignment.get(1).unwrap().video, PathBuf::from("pilot.mkv"));
        assert_eq!(resolution.assignment.get(2).unwrap().video, PathBuf::from("recap.mkv"));
        assert_eq!(resolution.assignment.get(2).unwrap().score, 0.85);
    }

    #[test]
    fn test_optimal_with_more_videos_than_episodes() {
        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Optimal, 0.0);
        resolver.push(row("a.mkv", &[(1, 0.5)])).unwrap();
        resolver.push(row("b.mkv", &[(1, 0.9)])).unwrap();
        resolver.push(row("c.mkv", &[(1, 0.1)])).unwrap();

        let resolution = resolver.finish().unwrap();
        assert_eq!(resolution.assignment.len(), 1);
        assert_eq!(resolution.assignment.get(1).unwrap().video, PathBuf::from("b.mkv"));
        assert_eq!(
            resolution.unassigned,
            vec![PathBuf::from("a.mkv"), PathBuf::from("c.mkv")]
        );
    }

    #[test]
    fn test_max_weight_matching_beats_greedy() {
        let weights = vec![
            vec![0.9, 0.8, 0.1],
            vec![0.85, 0.2, 0.1],
            vec![0.1, 0.7, 0.6],
        ];
        let mut pairs = max_weight_matching(&weights);
        pairs.sort();
        assert_eq!(pairs, vec![(0, 1), (1, 0), (2, 2)]);
    }

    #[test]
    fn test_end_to_end_scoring_prefers_true_episode() {
        let index = index(&[(1, "a cat sat on a mat"), (2, "a dog ran in the park")]);
        let candidate = VideoCandidate {
            path: PathBuf::from("/videos/unknown.mkv"),
            probe_transcript: "a cat sat on the mat".to_string(),
        };

        let score_row = ScoreRow::compute(&candidate, &index, &SimilarityScorer::default());
        assert_eq!(score_row.best_episode, Some(1));
        assert!(score_row.score_for(1).unwrap() > score_row.score_for(2).unwrap());

        let mut resolver = AssignmentResolver::new(AssignmentPolicy::Greedy, 0.0);
        resolver.push(score_row).unwrap();
        let resolution = resolver.finish().unwrap();
        assert_eq!(
            resolution.assignment.episode_of(Path::new("/videos/unknown.mkv")),
            Some(1)
        );
    }
}
