//! Scriptable embedder for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::error::EmbeddingError;
use super::hashed::HashedEmbedder;

/// Hashed embedder with switches for failure and dimension drift.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    inner: HashedEmbedder,
    failing: Arc<AtomicBool>,
    output_dim: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            inner: HashedEmbedder::new(dim.max(1)).expect("dimension is positive"),
            failing: Arc::new(AtomicBool::new(false)),
            output_dim: Arc::new(AtomicUsize::new(dim.max(1))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes every encode call fail with `EncodingFailed`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Truncates or zero-pads vectors to `dim` from now on.
    pub fn set_output_dimension(&self, dim: usize) {
        self.output_dim.store(dim, Ordering::SeqCst);
    }

    /// Number of `encode_batch` calls so far.
    pub fn encode_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dimension(&self) -> usize {
        self.output_dim.load(Ordering::SeqCst)
    }

    pub fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::EncodingFailed {
                reason: "mock embedder set to fail".to_string(),
            });
        }

        let dim = self.dimension();
        Ok(self
            .inner
            .encode_batch(texts)
            .into_iter()
            .map(|mut v| {
                v.resize(dim, 0.0);
                v
            })
            .collect())
    }
}
