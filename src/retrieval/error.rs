use std::time::Duration;
use thiserror::Error;

use crate::corpus::CorpusError;

/// Failures of a query. "No good match" is never an error; it is the
/// `none` confidence tier.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("query timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
