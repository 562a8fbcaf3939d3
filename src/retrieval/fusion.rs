//! Linear fusion of lexical costs and semantic similarities.

use std::collections::{BTreeMap, BTreeSet};

use super::types::{ScoreMap, ScoredCandidate};
use crate::constants::{LEXICAL_FLAT_SIMILARITY, LEXICAL_SIMILARITY_CAP};

/// Turns BM25 costs (lower is better) into similarities in `[0, 0.9]`.
///
/// When every cost is equal (including a single row, or substring hits that
/// all carry `0.0`) each id gets the flat `0.3`. Duplicate ids keep their
/// first (best-ranked) cost.
pub fn normalize_lexical(lexical: &[ScoredCandidate]) -> ScoreMap {
    let mut costs: BTreeMap<i64, f32> = BTreeMap::new();
    for c in lexical {
        costs.entry(c.id).or_insert(c.score);
    }

    let Some((min, max)) = costs.values().fold(None, |acc: Option<(f32, f32)>, &s| {
        Some(match acc {
            Some((lo, hi)) => (lo.min(s), hi.max(s)),
            None => (s, s),
        })
    }) else {
        return ScoreMap::new();
    };

    if max == min {
        return costs
            .keys()
            .map(|&id| (id, LEXICAL_FLAT_SIMILARITY))
            .collect();
    }

    let span = max - min;
    costs
        .into_iter()
        .map(|(id, raw)| (id, (1.0 - (raw - min) / span) * LEXICAL_SIMILARITY_CAP))
        .collect()
}

/// Fuses both tiers: `alpha * semantic + (1 - alpha) * lexical`, missing
/// scores read as `0.0`. Sorted by fused score descending, ties by ascending id.
pub fn fuse(lexical: &[ScoredCandidate], semantic: &ScoreMap, alpha: f32) -> Vec<ScoredCandidate> {
    if lexical.is_empty() && semantic.is_empty() {
        return Vec::new();
    }

    let lexical_sim = normalize_lexical(lexical);
    let ids: BTreeSet<i64> = lexical_sim.ids().chain(semantic.ids()).collect();

    let mut fused: Vec<ScoredCandidate> = ids
        .into_iter()
        .map(|id| {
            ScoredCandidate::new(
                id,
                alpha * semantic.get(id) + (1.0 - alpha) * lexical_sim.get(id),
            )
        })
        .collect();

    // ids are ascending here, so a stable sort leaves ties in id order
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}
