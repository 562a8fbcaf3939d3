use serde::{Deserialize, Serialize};

/// Coarse confidence label for the best answer of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Mid,
    Low,
    /// No candidate at all.
    None,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Mid => "mid",
            ConfidenceTier::Low => "low",
            ConfidenceTier::None => "none",
        }
    }

    /// `true` for `high` and `mid`.
    pub fn is_confident(&self) -> bool {
        matches!(self, ConfidenceTier::High | ConfidenceTier::Mid)
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps the top score to a tier. Bounds are inclusive; `low <= high` is the
/// caller's responsibility.
pub fn classify(top: f32, high: f32, low: f32) -> ConfidenceTier {
    if top >= high {
        ConfidenceTier::High
    } else if top >= low {
        ConfidenceTier::Mid
    } else {
        ConfidenceTier::Low
    }
}

/// Tier and score for an optional top score (`None` -> `(None, 0.0)`).
pub fn classify_top(top: Option<f32>, high: f32, low: f32) -> (ConfidenceTier, f32) {
    match top {
        Some(score) => (classify(score, high, low), score),
        None => (ConfidenceTier::None, 0.0),
    }
}
