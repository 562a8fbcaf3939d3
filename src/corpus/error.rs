use thiserror::Error;

/// Errors raised by a [`CorpusStore`](super::CorpusStore).
#[derive(Debug, Error)]
pub enum CorpusError {
    /// The full-text index is missing or cannot be queried. Recoverable by
    /// falling back to substring search.
    #[error("full-text index unavailable: {reason}")]
    IndexUnavailable { reason: String },

    #[error("corpus store unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("faq {id} not found")]
    NotFound { id: i64 },

    #[error("invalid faq record: {reason}")]
    InvalidRecord { reason: String },

    #[error("corpus io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CorpusResult<T> = Result<T, CorpusError>;
