//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `WONK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_FUSE_ALPHA, DEFAULT_HASHED_EMBEDDING_DIM, DEFAULT_HIGH_THRESHOLD,
    DEFAULT_LOW_THRESHOLD, DEFAULT_MAX_SEQ_LEN, DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_TOP_K, MAX_TOP_K,
};
use crate::embedding::{BackendPreference, EmbeddingConfig, Pooling};
use crate::retrieval::RetrievalParams;

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `WONK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite corpus file. Default: `data/database.db`.
    pub db_path: PathBuf,

    /// Master switch for the semantic tier. Default: `true`.
    pub use_semantic: bool,

    /// Embedding backend preference. Default: `auto`.
    pub embedding_backend: BackendPreference,

    /// BERT model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    pub model_dir: Option<PathBuf>,

    /// Output dimension of the hashed embedder. Default: `384`.
    pub hashed_dim: usize,

    /// Fusion weight of the semantic tier. Default: `0.5`.
    pub fuse_alpha: f32,

    /// Lower bound of the `high` tier. Default: `0.8`.
    pub high_threshold: f32,

    /// Lower bound of the `mid` tier. Default: `0.5`.
    pub low_threshold: f32,

    /// Candidates returned per query. Default: `5`.
    pub top_k: usize,

    /// Whether the fuzzy fallback tier may scan the corpus. Default: `true`.
    pub fuzzy_fallback: bool,

    /// Bound applied by the serving layer to one `answer` call. Default: 5s.
    pub query_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            use_semantic: true,
            embedding_backend: BackendPreference::Auto,
            model_dir: None,
            hashed_dim: DEFAULT_HASHED_EMBEDDING_DIM,
            fuse_alpha: DEFAULT_FUSE_ALPHA,
            high_threshold: DEFAULT_HIGH_THRESHOLD,
            low_threshold: DEFAULT_LOW_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            fuzzy_fallback: true,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }
}

impl Config {
    const ENV_DB_PATH: &'static str = "WONK_DB_PATH";
    const ENV_USE_SEMANTIC: &'static str = "WONK_USE_SEMANTIC";
    const ENV_EMBEDDING_BACKEND: &'static str = "WONK_EMBEDDING_BACKEND";
    const ENV_MODEL_DIR: &'static str = "WONK_MODEL_DIR";
    const ENV_HASHED_DIM: &'static str = "WONK_HASHED_DIM";
    const ENV_FUSE_ALPHA: &'static str = "WONK_FUSE_ALPHA";
    const ENV_CONFIDENCE_HIGH: &'static str = "WONK_CONFIDENCE_HIGH";
    const ENV_CONFIDENCE_LOW: &'static str = "WONK_CONFIDENCE_LOW";
    const ENV_TOP_K: &'static str = "WONK_TOP_K";
    const ENV_FUZZY_FALLBACK: &'static str = "WONK_FUZZY_FALLBACK";
    const ENV_QUERY_TIMEOUT_MS: &'static str = "WONK_QUERY_TIMEOUT_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Only parses; call [`Config::validate`] to check ranges and paths.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = Self::parse_path_from_env(Self::ENV_DB_PATH, defaults.db_path);
        let use_semantic = Self::parse_bool_from_env(Self::ENV_USE_SEMANTIC, defaults.use_semantic)?;
        let embedding_backend = Self::parse_backend_from_env(defaults.embedding_backend)?;
        let model_dir = Self::parse_optional_path_from_env(Self::ENV_MODEL_DIR);
        let hashed_dim = Self::parse_usize_from_env(Self::ENV_HASHED_DIM, defaults.hashed_dim)?;
        let fuse_alpha = Self::parse_f32_from_env(Self::ENV_FUSE_ALPHA, defaults.fuse_alpha)?;
        let high_threshold =
            Self::parse_f32_from_env(Self::ENV_CONFIDENCE_HIGH, defaults.high_threshold)?;
        let low_threshold =
            Self::parse_f32_from_env(Self::ENV_CONFIDENCE_LOW, defaults.low_threshold)?;
        let top_k = Self::parse_usize_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let fuzzy_fallback =
            Self::parse_bool_from_env(Self::ENV_FUZZY_FALLBACK, defaults.fuzzy_fallback)?;
        let query_timeout = Self::parse_usize_from_env(
            Self::ENV_QUERY_TIMEOUT_MS,
            defaults.query_timeout.as_millis() as usize,
        )
        .map(|ms| Duration::from_millis(ms as u64))?;

        Ok(Self {
            db_path,
            use_semantic,
            embedding_backend,
            model_dir,
            hashed_dim,
            fuse_alpha,
            high_threshold,
            low_threshold,
            top_k,
            fuzzy_fallback,
            query_timeout,
        })
    }

    /// Validates ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_unit_interval(Self::ENV_FUSE_ALPHA, self.fuse_alpha)?;
        Self::check_unit_interval(Self::ENV_CONFIDENCE_HIGH, self.high_threshold)?;
        Self::check_unit_interval(Self::ENV_CONFIDENCE_LOW, self.low_threshold)?;

        if self.low_threshold > self.high_threshold {
            return Err(ConfigError::InvalidThresholds {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }

        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_TOP_K,
                value: self.top_k.to_string(),
                expected: "1..=50",
            });
        }

        if self.hashed_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_HASHED_DIM,
                value: self.hashed_dim.to_string(),
                expected: "a positive dimension",
            });
        }

        if self.query_timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_QUERY_TIMEOUT_MS,
                value: "0".to_string(),
                expected: "a positive number of milliseconds",
            });
        }

        if self.db_path.is_dir() {
            return Err(ConfigError::NotAFile {
                path: self.db_path.clone(),
            });
        }

        if let Some(ref path) = self.model_dir {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Query-time tunables handed to the orchestrator.
    pub fn retrieval_params(&self) -> RetrievalParams {
        RetrievalParams {
            top_k: self.top_k,
            alpha: self.fuse_alpha,
            high: self.high_threshold,
            low: self.low_threshold,
        }
    }

    /// Embedding backend settings; `WONK_USE_SEMANTIC=false` forces `disabled`.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        let preference = if self.use_semantic {
            self.embedding_backend
        } else {
            BackendPreference::Disabled
        };

        EmbeddingConfig {
            preference,
            model_dir: self.model_dir.clone(),
            pooling: Pooling::Cls,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            hashed_dim: self.hashed_dim,
        }
    }

    fn check_unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::OutOfRange {
                name,
                value: value.to_string(),
                expected: "0.0..=1.0",
            })
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_backend_from_env(default: BackendPreference) -> Result<BackendPreference, ConfigError> {
        match env::var(Self::ENV_EMBEDDING_BACKEND) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidBackend { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Ok(value) = env::var(name) else {
            return Ok(default);
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { name, value }),
        }
    }

    fn parse_f32_from_env(name: &'static str, default: f32) -> Result<f32, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse::<f32>()
                .map_err(|e| ConfigError::InvalidNumber {
                    name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidNumber {
                    name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }
}
