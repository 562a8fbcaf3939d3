//! In-memory semantic index over the whole corpus.
//!
//! The index is built lazily on first use and rebuilt wholesale whenever it
//! goes stale; it is never patched in place. Readers take an `Arc` snapshot
//! of the last good cache, so a rebuild never blocks a search already holding
//! one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use half::f16;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::constants::ENCODE_BATCH_SIZE;
use crate::corpus::{CorpusResult, CorpusStore, FaqRecord};
use crate::embedding::{EmbeddingBackend, EmbeddingError};

use super::types::ScoredCandidate;

/// L2-normalized half-precision vectors, parallel to `ids`.
#[derive(Debug, Clone, Default)]
pub struct SemanticCache {
    ids: Vec<i64>,
    vectors: Vec<Vec<f16>>,
    dim: usize,
}

impl SemanticCache {
    /// Normalizes and packs vectors. All vectors must share one dimension.
    pub fn from_vectors(ids: Vec<i64>, vectors: Vec<Vec<f32>>) -> Result<Self, EmbeddingError> {
        if ids.len() != vectors.len() {
            return Err(EmbeddingError::EncodingFailed {
                reason: format!("{} ids but {} vectors", ids.len(), vectors.len()),
            });
        }

        let dim = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let vectors = vectors
            .into_iter()
            .map(|mut v| {
                normalize(&mut v);
                v.into_iter().map(f16::from_f32).collect()
            })
            .collect();

        Ok(Self { ids, vectors, dim })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Cosine similarity against every entry, best first. Ties keep corpus order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredCandidate> {
        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored: Vec<ScoredCandidate> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(&id, v)| {
                let dot: f32 = v.iter().zip(&query).map(|(a, b)| a.to_f32() * b).sum();
                ScoredCandidate::new(id, dot)
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k.max(1));
        scored
    }
}

/// Scales to unit length; a zero vector is left as is.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Debug, Default)]
struct BuildState {
    /// Corpus size seen by the last successful build.
    built_count: Option<usize>,
    stale: bool,
    invalidations: u64,
}

/// Lazily built semantic index.
pub struct SemanticIndex {
    backend: Arc<EmbeddingBackend>,
    cache: RwLock<Arc<SemanticCache>>,
    state: Mutex<BuildState>,
    rebuild_lock: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SemanticIndex")
            .field("backend", &self.backend.name())
            .field("entries", &self.cache.read().len())
            .field("built_count", &state.built_count)
            .field("stale", &state.stale)
            .field("generation", &self.generation())
            .finish()
    }
}

impl SemanticIndex {
    pub fn new(backend: EmbeddingBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            cache: RwLock::new(Arc::new(SemanticCache::default())),
            state: Mutex::new(BuildState::default()),
            rebuild_lock: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &EmbeddingBackend {
        &self.backend
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Number of successful builds so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Arc<SemanticCache> {
        Arc::clone(&self.cache.read())
    }

    pub fn is_built(&self) -> bool {
        self.state.lock().built_count.is_some()
    }

    pub fn is_stale(&self) -> bool {
        self.state.lock().stale
    }

    /// Marks the cache for rebuild on next use.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.stale = true;
        state.invalidations += 1;
    }

    /// Marks the cache stale if `count` differs from the size it was built
    /// from. Returns whether it did. Never rebuilds.
    pub fn observe_corpus_count(&self, count: usize) -> bool {
        let mut state = self.state.lock();
        match state.built_count {
            Some(built) if built != count => {
                debug!(built, count, "corpus size changed, semantic index stale");
                state.stale = true;
                state.invalidations += 1;
                true
            }
            _ => false,
        }
    }

    fn needs_rebuild(&self) -> bool {
        let stale_or_unbuilt = {
            let state = self.state.lock();
            state.stale || state.built_count.is_none()
        };
        stale_or_unbuilt || self.cache.read().is_empty()
    }

    /// Rebuilds the cache from a full corpus scan.
    ///
    /// Encoding failures are logged and leave the index empty and unbuilt;
    /// only corpus errors are returned.
    pub async fn build_from_corpus<S: CorpusStore>(&self, corpus: &S) -> CorpusResult<()> {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild(corpus).await
    }

    /// Single-flight rebuild: concurrent callers wait for one rebuild and
    /// skip their own if it succeeded meanwhile.
    async fn ensure_fresh<S: CorpusStore>(&self, corpus: &S) -> CorpusResult<()> {
        if !self.needs_rebuild() {
            return Ok(());
        }

        let seen = self.generation();
        let _guard = self.rebuild_lock.lock().await;
        if self.generation() != seen || !self.needs_rebuild() {
            return Ok(());
        }
        self.rebuild(corpus).await
    }

    #[instrument(skip_all, fields(backend = self.backend.name()))]
    async fn rebuild<S: CorpusStore>(&self, corpus: &S) -> CorpusResult<()> {
        if !self.backend.is_available() {
            return Ok(());
        }

        let started = self.state.lock().invalidations;
        let records = corpus.full_scan().await?;
        let count = records.len();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let texts: Vec<String> = records.iter().map(FaqRecord::semantic_text).collect();

        let built = self
            .encode(texts)
            .await
            .and_then(|vectors| SemanticCache::from_vectors(ids, vectors));

        match built {
            Ok(cache) => {
                let dimension = cache.dimension();
                *self.cache.write() = Arc::new(cache);
                {
                    let mut state = self.state.lock();
                    state.built_count = Some(count);
                    if state.invalidations == started {
                        state.stale = false;
                    }
                }
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                info!(records = count, dimension, generation, "semantic index built");
            }
            Err(e) => {
                warn!(error = %e, records = count, "semantic index build failed");
                *self.cache.write() = Arc::new(SemanticCache::default());
                self.state.lock().built_count = None;
            }
        }
        Ok(())
    }

    /// Encodes on the blocking pool in fixed-size batches.
    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let backend = Arc::clone(&self.backend);
        let expected = texts.len();
        let vectors = tokio::task::spawn_blocking(move || {
            let mut out = Vec::with_capacity(texts.len());
            for chunk in texts.chunks(ENCODE_BATCH_SIZE) {
                let batch: Vec<&str> = chunk.iter().map(String::as_str).collect();
                out.extend(backend.encode_batch(&batch)?);
            }
            Ok::<_, EmbeddingError>(out)
        })
        .await
        .map_err(|e| EmbeddingError::EncodingFailed {
            reason: format!("encoding task failed: {e}"),
        })??;

        if vectors.len() != expected {
            return Err(EmbeddingError::EncodingFailed {
                reason: format!("expected {expected} vectors, got {}", vectors.len()),
            });
        }
        Ok(vectors)
    }

    /// Top `top_k` records by cosine similarity to `text`.
    ///
    /// Rebuilds first if the cache is stale, unbuilt or empty. `Ok(None)`
    /// means "no semantic signal": backend unavailable, build or query
    /// encoding failed, or the query vector does not match the cache
    /// dimension. An empty corpus gives `Ok(Some(vec![]))`.
    pub async fn query<S: CorpusStore>(
        &self,
        corpus: &S,
        text: &str,
        top_k: usize,
    ) -> CorpusResult<Option<Vec<ScoredCandidate>>> {
        if !self.backend.is_available() {
            return Ok(None);
        }

        self.ensure_fresh(corpus).await?;

        let cache = self.snapshot();
        if cache.is_empty() {
            return Ok(self.is_built().then(Vec::new));
        }

        let query = match self.encode(vec![text.to_string()]).await {
            Ok(mut vectors) => vectors.pop(),
            Err(e) => {
                warn!(error = %e, "query encoding failed, no semantic signal");
                return Ok(None);
            }
        };
        let Some(query) = query else {
            return Ok(None);
        };

        if query.len() != cache.dimension() {
            let e = EmbeddingError::DimensionMismatch {
                expected: cache.dimension(),
                actual: query.len(),
            };
            warn!(error = %e, "no semantic signal");
            return Ok(None);
        }

        let hits = cache.search(&query, top_k);
        debug!(hits = hits.len(), "semantic hits");
        Ok(Some(hits))
    }
}
