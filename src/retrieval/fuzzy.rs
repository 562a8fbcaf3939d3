//! Last-resort fuzzy matching over the whole corpus.

use std::collections::BTreeSet;

use crate::corpus::FaqRecord;

use super::types::ScoredCandidate;

fn token_set(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn join_with(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base} {rest}"),
    }
}

/// Token-set similarity in `[0, 1]`, insensitive to word order and repetition.
///
/// Shared tokens are compared against each side's leftovers with normalized
/// Levenshtein similarity. If one side's tokens are a subset of the other's
/// the score is `1.0`; an empty side scores `0.0`.
///
/// Uses normalized Levenshtein (substitution costs 1, divided by the longer
/// length), so scores differ from an InDel-based ratio on the same pair.
pub fn token_set_ratio(a: &str, b: &str) -> f32 {
    let ta = token_set(a);
    let tb = token_set(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = ta.intersection(&tb).map(String::as_str).collect();
    let diff_ab: Vec<&str> = ta.difference(&tb).map(String::as_str).collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).map(String::as_str).collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 1.0;
    }

    let sect = sect.join(" ");
    let combined_a = join_with(&sect, &diff_ab.join(" "));
    let combined_b = join_with(&sect, &diff_ba.join(" "));

    let mut best = strsim::normalized_levenshtein(&combined_a, &combined_b);
    if !sect.is_empty() {
        best = best
            .max(strsim::normalized_levenshtein(&sect, &combined_a))
            .max(strsim::normalized_levenshtein(&sect, &combined_b));
    }
    best as f32
}

/// Fuzzy fallback tier. Only consulted when fusion produced nothing.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    enabled: bool,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl FuzzyMatcher {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Scores each record by the better of question and answer similarity
    /// and returns the top `top_k` non-zero scores (ties by ascending id).
    pub fn rank(&self, query: &str, records: &[FaqRecord], top_k: usize) -> Vec<ScoredCandidate> {
        if !self.enabled || query.trim().is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredCandidate> = records
            .iter()
            .map(|r| {
                let score = token_set_ratio(query, &r.question).max(token_set_ratio(query, &r.answer));
                ScoredCandidate::new(r.id, score)
            })
            .filter(|c| c.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        scored.truncate(top_k.max(1));
        scored
    }
}
