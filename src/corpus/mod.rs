//! FAQ corpus storage.
//!
//! The retrieval core only reads through [`CorpusStore`]. [`SqliteCorpus`] is
//! the production store; [`MockCorpusStore`] is an in-memory stand-in for tests.

pub mod error;
pub mod import;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod sqlite;
pub mod types;


pub use error::{CorpusError, CorpusResult};
pub use import::{ImportReport, import_jsonl, parse_jsonl};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockCorpusStore;
pub use sqlite::SqliteCorpus;
pub use types::{FaqRecord, LexicalRow, NewFaq};

/// Read access to the FAQ corpus.
pub trait CorpusStore: Send + Sync {
    /// Ranked full-text search. `match_expr` is an FTS5 MATCH expression; rows
    /// come back best first with their BM25 cost (lower is better).
    ///
    /// Fails with [`CorpusError::IndexUnavailable`] when there is no full-text index.
    fn lexical_raw_search(
        &self,
        match_expr: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = CorpusResult<Vec<LexicalRow>>> + Send;

    /// Case-insensitive substring match over question and answer. Every row
    /// carries raw score `0.0`.
    fn substring_search(
        &self,
        needle: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = CorpusResult<Vec<LexicalRow>>> + Send;

    /// Every record, ordered by id ascending.
    fn full_scan(&self) -> impl std::future::Future<Output = CorpusResult<Vec<FaqRecord>>> + Send;

    fn count(&self) -> impl std::future::Future<Output = CorpusResult<usize>> + Send;
}
