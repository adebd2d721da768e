//! Text similarity and keyword extraction.
//!
//! Both work on lowercase, whitespace-split tokens. Punctuation stays attached
//! to its word, so `"france?"` and `"france"` are different tokens.

use std::collections::HashSet;

/// Merge threshold: a new message scoring above this against a stored
/// question bumps that record instead of inserting.
pub const MERGE_THRESHOLD: f64 = 0.7;

/// Lookup threshold: a stored question must score above this to be served.
pub const LOOKUP_THRESHOLD: f64 = 0.6;

/// Maximum number of keywords kept per record.
pub const MAX_KEYWORDS: usize = 5;

/// Articles, copulas, and wh-question words dropped by keyword extraction.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "what", "how", "why", "where", "when", "who",
    "which",
];

fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Jaccard similarity of the two texts' token sets, in `[0.0, 1.0]`.
///
/// Returns 0.0 if either text has no tokens.
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let left = token_set(a);
    let right = token_set(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

/// First [`MAX_KEYWORDS`] lowercase tokens longer than three characters that
/// are not stop words, in original order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .take(MAX_KEYWORDS)
        .map(str::to_owned)
        .collect()
}
