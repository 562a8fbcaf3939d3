use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceTier;
use crate::constants::{
    DEFAULT_FUSE_ALPHA, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_K,
};

/// Record id with a tier-local score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub id: i64,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(id: i64, score: f32) -> Self {
        Self { id, score }
    }
}

/// id -> score, reading `0.0` for ids it does not hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap {
    scores: BTreeMap<i64, f32>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i64) -> f32 {
        self.scores.get(&id).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, id: i64, score: f32) {
        self.scores.insert(id, score);
    }

    pub fn contains(&self, id: i64) -> bool {
        self.scores.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.scores.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<ScoredCandidate> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = ScoredCandidate>>(iter: T) -> Self {
        Self {
            scores: iter.into_iter().map(|c| (c.id, c.score)).collect(),
        }
    }
}

impl FromIterator<(i64, f32)> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = (i64, f32)>>(iter: T) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// A resolved answer candidate. `score` ranks within one query only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub score: f32,
}

/// Which tier produced the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPath {
    Fused,
    Fuzzy,
    Empty,
}

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub candidates: Vec<RankedResult>,
    pub tier: ConfidenceTier,
    pub top_score: f32,
    pub path: AnswerPath,
}

impl QueryAnswer {
    pub fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            tier: ConfidenceTier::None,
            top_score: 0.0,
            path: AnswerPath::Empty,
        }
    }

    pub fn best(&self) -> Option<&RankedResult> {
        self.candidates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Per-query tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    pub top_k: usize,
    /// Semantic weight in fusion.
    pub alpha: f32,
    pub high: f32,
    pub low: f32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_FUSE_ALPHA,
            high: DEFAULT_HIGH_THRESHOLD,
            low: DEFAULT_LOW_THRESHOLD,
        }
    }
}

impl RetrievalParams {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}
