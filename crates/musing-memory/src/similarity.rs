//! Coarse token-overlap similarity between two insight texts.

use std::collections::HashSet;

/// Overlap ratio above which two texts count as the same insight.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Tokens of `a` (duplicates counted) found anywhere in `b`, over the shorter token count.
///
/// Both texts are lower-cased and split on whitespace. The numerator walks `a`,
/// so the score is not strictly symmetric. Returns 0.0 when either side has no tokens.
pub fn overlap_ratio(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let tokens_a: Vec<&str> = a.split_whitespace().collect();
    let tokens_b: Vec<&str> = b.split_whitespace().collect();

    let denominator = tokens_a.len().min(tokens_b.len());
    if denominator == 0 {
        return 0.0;
    }

    let set_b: HashSet<&str> = tokens_b.iter().copied().collect();
    let common = tokens_a.iter().filter(|t| set_b.contains(*t)).count();
    common as f64 / denominator as f64
}

/// True when `a` and `b` overlap by more than [`SIMILARITY_THRESHOLD`].
pub fn similar(a: &str, b: &str) -> bool {
    overlap_ratio(a, b) > SIMILARITY_THRESHOLD
}
