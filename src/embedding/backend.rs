use tracing::{info, warn};

use super::bert::BertEmbedder;
use super::config::{BackendPreference, EmbeddingConfig};
use super::error::EmbeddingError;
use super::hashed::HashedEmbedder;
#[cfg(any(test, feature = "mock"))]
use super::mock::MockEmbedder;

/// The embedder behind the semantic index, chosen once at construction.
#[derive(Debug)]
pub enum EmbeddingBackend {
    Bert(BertEmbedder),
    Hashed(HashedEmbedder),
    #[cfg(any(test, feature = "mock"))]
    Mock(MockEmbedder),
    /// No embedder; the semantic tier contributes nothing.
    Unavailable { reason: String },
}

impl EmbeddingBackend {
    /// Builds the backend for `config`. Never fails: load errors degrade to
    /// [`EmbeddingBackend::Unavailable`] (or to hashed under `auto`).
    pub fn select(config: &EmbeddingConfig) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "invalid embedding configuration, semantic search disabled");
            return Self::unavailable(e.to_string());
        }

        let backend = match config.preference {
            BackendPreference::Disabled => Self::unavailable("semantic search disabled"),
            BackendPreference::Hashed => Self::hashed(config.hashed_dim),
            BackendPreference::Bert => match Self::try_bert(config) {
                Ok(bert) => Self::Bert(bert),
                Err(e) => {
                    warn!(error = %e, "BERT embedder unavailable, semantic search disabled");
                    Self::unavailable(e.to_string())
                }
            },
            BackendPreference::Auto => match Self::try_bert(config) {
                Ok(bert) => Self::Bert(bert),
                Err(e) => {
                    if config.model_dir.is_some() {
                        warn!(error = %e, "BERT embedder unavailable, using hashed embedder");
                    }
                    Self::hashed(config.hashed_dim)
                }
            },
        };

        info!(
            backend = backend.name(),
            dimension = ?backend.dimension(),
            "embedding backend selected"
        );
        backend
    }

    fn try_bert(config: &EmbeddingConfig) -> Result<BertEmbedder, EmbeddingError> {
        let model_dir = config
            .model_dir
            .as_deref()
            .ok_or_else(|| EmbeddingError::BackendUnavailable {
                reason: "no model directory configured".to_string(),
            })?;
        BertEmbedder::load(model_dir, config.pooling, config.max_seq_len)
    }

    fn hashed(dim: usize) -> Self {
        match HashedEmbedder::new(dim) {
            Ok(embedder) => Self::Hashed(embedder),
            Err(e) => Self::unavailable(e.to_string()),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bert(_) => "bert",
            Self::Hashed(_) => "hashed",
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(_) => "mock",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable { .. })
    }

    /// Output dimension, `None` when unavailable.
    pub fn dimension(&self) -> Option<usize> {
        match self {
            Self::Bert(bert) => Some(bert.dimension()),
            Self::Hashed(hashed) => Some(hashed.dimension()),
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(mock) => Some(mock.dimension()),
            Self::Unavailable { .. } => None,
        }
    }

    /// Encodes a batch of texts. Blocking; run it off the async executor.
    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self {
            Self::Bert(bert) => bert.encode_batch(texts),
            Self::Hashed(hashed) => Ok(hashed.encode_batch(texts)),
            #[cfg(any(test, feature = "mock"))]
            Self::Mock(mock) => mock.encode_batch(texts),
            Self::Unavailable { reason } => Err(EmbeddingError::BackendUnavailable {
                reason: reason.clone(),
            }),
        }
    }
}
