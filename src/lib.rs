//! Wonk library crate (used by the `wonk` binary and integration tests).
//!
//! Answers free-text questions from a curated FAQ corpus:
//!
//! - [`corpus`]: SQLite store with an FTS5 index, JSONL import, mock store.
//! - [`embedding`]: BERT and hashed embedders behind [`EmbeddingBackend`].
//! - [`retrieval`]: lexical and semantic tiers, fusion, fuzzy fallback and
//!   the [`QueryOrchestrator`] that ties them to a [`ConfidenceTier`].
//! - [`config`]: `WONK_*` environment configuration.
//!
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod corpus;
pub mod embedding;
pub mod retrieval;

pub use config::{Config, ConfigError};
pub use corpus::{
    CorpusError, CorpusResult, CorpusStore, FaqRecord, ImportReport, LexicalRow, NewFaq,
    SqliteCorpus, import_jsonl, parse_jsonl,
};
#[cfg(any(test, feature = "mock"))]
pub use corpus::MockCorpusStore;
pub use embedding::{
    BackendPreference, BertEmbedder, EmbeddingBackend, EmbeddingConfig, EmbeddingError,
    HashedEmbedder, Pooling,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use retrieval::{
    AnswerPath, ConfidenceTier, FuzzyMatcher, QueryAnswer, QueryOrchestrator, RankedResult,
    RetrievalError, RetrievalParams, RetrievalResult, ScoreMap, ScoredCandidate, SemanticCache,
    SemanticIndex, classify, fuse, normalize_lexical, token_set_ratio,
};
