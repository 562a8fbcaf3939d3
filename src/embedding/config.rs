use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{DEFAULT_HASHED_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};
use crate::embedding::error::EmbeddingError;

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendPreference {
    /// BERT when a model directory is configured and loads, else hashed.
    #[default]
    Auto,
    Bert,
    Hashed,
    Disabled,
}

impl BackendPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Bert => "bert",
            Self::Hashed => "hashed",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendPreference {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "bert" => Ok(Self::Bert),
            "hashed" | "hash" => Ok(Self::Hashed),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(EmbeddingError::InvalidConfig {
                reason: format!("unknown embedding backend '{other}'"),
            }),
        }
    }
}

/// How token states are reduced to one sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    #[default]
    Cls,
    Mean,
}

#[derive(Debug, Clone)]
/// Configuration for [`EmbeddingBackend::select`](super::EmbeddingBackend::select).
pub struct EmbeddingConfig {
    pub preference: BackendPreference,
    /// Directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: Option<PathBuf>,
    pub pooling: Pooling,
    /// Max tokens per input; longer inputs are truncated.
    pub max_seq_len: usize,
    /// Output dimension of the hashed embedder.
    pub hashed_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            preference: BackendPreference::Auto,
            model_dir: None,
            pooling: Pooling::Cls,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            hashed_dim: DEFAULT_HASHED_EMBEDDING_DIM,
        }
    }
}

impl EmbeddingConfig {
    pub fn hashed(dim: usize) -> Self {
        Self {
            preference: BackendPreference::Hashed,
            hashed_dim: dim,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            preference: BackendPreference::Disabled,
            ..Default::default()
        }
    }

    pub fn bert<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            preference: BackendPreference::Bert,
            model_dir: Some(model_dir.into()),
            ..Default::default()
        }
    }

    pub fn with_pooling(mut self, pooling: Pooling) -> Self {
        self.pooling = pooling;
        self
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }
        if self.preference == BackendPreference::Hashed && self.hashed_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "hashed_dim must be positive".to_string(),
            });
        }
        Ok(())
    }
}
