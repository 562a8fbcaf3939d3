//! Cross-cutting retrieval defaults.
//!
//! Normalized lexical similarity never exceeds [`LEXICAL_SIMILARITY_CAP`].

/// Default fusion weight given to the semantic tier.
pub const DEFAULT_FUSE_ALPHA: f32 = 0.5;

/// Default lower bound of the `high` confidence tier.
pub const DEFAULT_HIGH_THRESHOLD: f32 = 0.8;

/// Default lower bound of the `mid` confidence tier.
pub const DEFAULT_LOW_THRESHOLD: f32 = 0.5;

/// Default number of candidates returned per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Upper bound accepted for `top_k`.
pub const MAX_TOP_K: usize = 50;

/// Similarity assigned to every lexical hit when all raw scores are equal.
pub const LEXICAL_FLAT_SIMILARITY: f32 = 0.3;

/// Ceiling of the normalized lexical similarity.
pub const LEXICAL_SIMILARITY_CAP: f32 = 0.9;

/// Output dimension of the hashed embedder (matches small BERT encoders).
pub const DEFAULT_HASHED_EMBEDDING_DIM: usize = 384;

/// Max tokens fed to the BERT encoder.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Records encoded per backend call while building the semantic cache.
pub const ENCODE_BATCH_SIZE: usize = 32;

/// Default serving-layer bound on a single `answer` call.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

/// Default SQLite corpus location.
pub const DEFAULT_DB_PATH: &str = "data/database.db";

/// Language tag used when an ingested record does not carry one.
pub const DEFAULT_LANGUAGE: &str = "auto";
