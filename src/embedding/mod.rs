//! Embedding backends for the semantic index.
//!
//! [`EmbeddingBackend::select`] picks one of:
//! - [`BertEmbedder`]: candle BERT encoder loaded from a model directory;
//! - [`HashedEmbedder`]: model-free signed feature hashing;
//! - `Unavailable`: semantic search off.

/// BERT sentence embedder.
pub mod bert;
pub mod backend;
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
pub mod hashed;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Tokenizer loading helpers.
pub mod utils;


pub use backend::EmbeddingBackend;
pub use bert::BertEmbedder;
pub use config::{BackendPreference, EmbeddingConfig, Pooling};
pub use error::EmbeddingError;
pub use hashed::HashedEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
