use serde::Serialize;

use super::dataset::RemedyRecord;
use super::ChatError;

/// Scores at or below this never count as a match.
pub const MATCH_THRESHOLD: f64 = 0.3;

/// Category similarity is discounted against query similarity.
const CATEGORY_WEIGHT: f64 = 0.7;

/// A scored remedy. Scores are in [0, 1], higher is closer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub record: RemedyRecord,
    pub score: f64,
}

/// Embedding-backed nearest-neighbour search over remedy records.
///
/// No implementation ships with the crate; the chatbot falls back to
/// keyword search when none is supplied.
pub trait SemanticIndex {
    /// At most `top_k` hits scoring at least `threshold`, best first.
    fn search(&self, query: &str, top_k: usize, threshold: f64) -> Result<Vec<SearchHit>, ChatError>;

    /// Index one more record.
    fn insert(&mut self, record: &RemedyRecord) -> Result<(), ChatError>;

    /// Number of indexed records.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding model identifier, for stats.
    fn model_name(&self) -> &str;
}

/// Ratcliff/Obershelp similarity: twice the matched characters over the
/// combined length, case-insensitive. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Characters in the longest common block plus, recursively, the matches
/// to its left and right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }
    size + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + size..], &b[start_b + size..])
}

/// Earliest longest common substring as `(start_a, start_b, len)`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca != cb {
                continue;
            }
            let run = previous[j] + 1;
            current[j + 1] = run;
            if run > best.2 {
                best = (i + 1 - run, j + 1 - run, run);
            }
        }
        previous = current;
    }
    best
}

/// Score one record against a query.
pub fn keyword_score(query: &str, record: &RemedyRecord) -> f64 {
    let query_score = similarity(query, &record.query);
    let category_score = similarity(query, &record.category) * CATEGORY_WEIGHT;
    query_score.max(category_score)
}

/// Best-scoring record, if it clears `MATCH_THRESHOLD`. Ties keep the
/// earlier record.
pub fn keyword_search(records: &[RemedyRecord], query: &str) -> Option<SearchHit> {
    let mut best: Option<(&RemedyRecord, f64)> = None;
    for record in records {
        let score = keyword_score(query, record);
        if best.map_or(score > 0.0, |(_, best_score)| score > best_score) {
            best = Some((record, score));
        }
    }
    best.filter(|(_, score)| *score > MATCH_THRESHOLD)
        .map(|(record, score)| SearchHit {
            record: record.clone(),
            score,
        })
}
