//! Character-level similarity ratio built from longest matching blocks.
//!
//! The longest common contiguous block is found first, then the procedure
//! recurses into the unmatched text left and right of it. The ratio is
//! `2 * matched / (len(a) + len(b))`.

use std::collections::HashMap;

/// Sequences at least this long are subject to the popularity heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matched block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Computes similarity ratios between transcripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    autojunk: bool,
}

impl SimilarityScorer {
    pub fn new(autojunk: bool) -> Self {
        Self { autojunk }
    }

    /// Similarity in `[0.0, 1.0]`. Two empty strings score 1.0.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        BlockMatcher::new(a, b, self.autojunk).ratio()
    }
}

/// Similarity of two strings with the default scorer.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    SimilarityScorer::default().score(a, b)
}

/// Finds matching blocks between two character sequences.
///
/// The inputs are put in canonical order (shorter first, then lexical) so the
/// result does not depend on argument order.
pub struct BlockMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl BlockMatcher {
    pub fn new(a: &str, b: &str, autojunk: bool) -> Self {
        let a_len = a.chars().count();
        let b_len = b.chars().count();
        let (a, b) = if (a_len, a) <= (b_len, b) { (a, b) } else { (b, a) };

        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let popular_threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= popular_threshold);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among blocks of maximal size the one starting earliest in `a` wins,
    /// then the one starting earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (&self.a, &self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

        // Run lengths ending at b[j] are stored at index j - blo + 1.
        let width = bhi.saturating_sub(blo) + 1;
        let mut j2len = vec![0usize; width];
        let mut new_j2len = vec![0usize; width];
        let mut touched: Vec<usize> = Vec::new();
        let mut new_touched: Vec<usize> = Vec::new();

        for i in alo..ahi {
            new_touched.clear();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j2len[j - blo] + 1;
                    new_j2len[j - blo + 1] = k;
                    new_touched.push(j - blo + 1);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            for &slot in &touched {
                j2len[slot] = 0;
            }
            std::mem::swap(&mut j2len, &mut new_j2len);
            std::mem::swap(&mut touched, &mut new_touched);
        }

        // Popular characters never seed a match but may extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// All matching blocks in ascending order, adjacent blocks merged.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let found = self.find_longest_match(alo, ahi, blo, bhi);
            if found.size == 0 {
                continue;
            }
            let (i, j, k) = (found.a_start, found.b_start, found.size);
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
            blocks.push(found);
        }
        blocks.sort();

        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len());
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.size == block.a_start
                        && last.b_start + last.size == block.b_start =>
                {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }
        merged
    }

    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        2.0 * matched as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_identical_strings_score_one() {
        for text in ["a", "a cat sat on a mat", "ünïcödé text"] {
            assert_eq!(similarity_ratio(text, text), 1.0);
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("", "abc"), 0.0);
        assert_eq!(similarity_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        assert!(approx(similarity_ratio("abcd", "bcde"), 0.75));
        assert!(approx(similarity_ratio("abc", "xyz"), 0.0));
        assert!(approx(
            similarity_ratio("a cat sat on the mat", "a cat sat on a mat"),
            34.0 / 38.0
        ));
    }

    #[test]
    fn test_score_is_symmetric() {
        let pairs = [
            ("a cat sat on a mat", "a dog ran in the park"),
            ("abab", "baba"),
            ("private Thread currentThread;", "private volatile Thread currentThread;"),
            ("the quick brown fox", "quick the fox brown"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity_ratio(a, b), similarity_ratio(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_transposition_scores_below_true_match() {
        let reference = "we have to go back to the island";
        let transposed = "to the island we have to go back";
        let faithful = "we have to go back to an island";
        assert!(similarity_ratio(reference, faithful) > similarity_ratio(reference, transposed));
    }

    #[test]
    fn test_progressive_corruption_does_not_raise_score() {
        let reference = "the quick brown fox jumps over the lazy dog while the cat sleeps";
        let mut corrupted: Vec<char> = reference.chars().collect();
        let mut previous = similarity_ratio(reference, reference);

        for position in (0..corrupted.len()).step_by(4) {
            corrupted[position] = '#';
            let text: String = corrupted.iter().collect();
            let score = similarity_ratio(reference, &text);
            assert!(score <= previous, "score rose to {score} after corrupting {position}");
            previous = score;
        }
        assert!(previous < 0.8);
    }

    #[test]
    fn test_matching_blocks_merge_and_order() {
        let matcher = BlockMatcher::new("abxcd", "abcd", false);
        let blocks = matcher.matching_blocks();
        assert_eq!(
            blocks,
            vec![
                Match { a_start: 0, b_start: 0, size: 2 },
                Match { a_start: 2, b_start: 3, size: 2 },
            ]
        );
    }

    #[test]
    fn test_autojunk_ignores_popular_characters_when_seeding() {
        let short = "xya";
        let long = format!("{}q", "a".repeat(300));
        let plain = SimilarityScorer::new(false).score(short, &long);
        let junked = SimilarityScorer::new(true).score(short, &long);
        assert!(approx(plain, 2.0 / 304.0));
        assert_eq!(junked, 0.0);
    }
}
