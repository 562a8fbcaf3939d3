//! Hybrid retrieval: lexical + semantic tiers, score fusion, fuzzy fallback
//! and confidence classification, driven by [`QueryOrchestrator`].

pub mod confidence;
pub mod error;
pub mod fusion;
pub mod fuzzy;
pub mod lexical;
pub mod orchestrator;
pub mod semantic;
pub mod types;

#[cfg(test)]
mod tests;

pub use confidence::{ConfidenceTier, classify, classify_top};
pub use error::{RetrievalError, RetrievalResult};
pub use fusion::{fuse, normalize_lexical};
pub use fuzzy::{FuzzyMatcher, token_set_ratio};
pub use lexical::fts_match_expression;
pub use orchestrator::QueryOrchestrator;
pub use semantic::{SemanticCache, SemanticIndex};
pub use types::{AnswerPath, QueryAnswer, RankedResult, RetrievalParams, ScoreMap, ScoredCandidate};
