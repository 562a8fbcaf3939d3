use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::corpus::{CorpusStore, LexicalRow};
use crate::embedding::EmbeddingBackend;

use super::confidence::classify_top;
use super::error::{RetrievalError, RetrievalResult};
use super::fusion::fuse;
use super::fuzzy::FuzzyMatcher;
use super::lexical;
use super::semantic::SemanticIndex;
use super::types::{AnswerPath, QueryAnswer, RankedResult, RetrievalParams, ScoreMap, ScoredCandidate};

/// Runs one query through every tier and classifies the result.
pub struct QueryOrchestrator<S: CorpusStore> {
    corpus: Arc<S>,
    semantic: SemanticIndex,
    fuzzy: FuzzyMatcher,
}

impl<S: CorpusStore> std::fmt::Debug for QueryOrchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("semantic", &self.semantic)
            .field("fuzzy", &self.fuzzy)
            .finish_non_exhaustive()
    }
}

impl<S: CorpusStore> QueryOrchestrator<S> {
    pub fn new(corpus: Arc<S>, backend: EmbeddingBackend, fuzzy: FuzzyMatcher) -> Self {
        Self {
            corpus,
            semantic: SemanticIndex::new(backend),
            fuzzy,
        }
    }

    /// Selects the embedding backend and fuzzy switch from `config`.
    pub fn from_config(corpus: Arc<S>, config: &Config) -> Self {
        let backend = EmbeddingBackend::select(&config.embedding_config());
        Self::new(corpus, backend, FuzzyMatcher::new(config.fuzzy_fallback))
    }

    pub fn corpus(&self) -> &S {
        &self.corpus
    }

    pub fn semantic_index(&self) -> &SemanticIndex {
        &self.semantic
    }

    pub fn fuzzy_matcher(&self) -> &FuzzyMatcher {
        &self.fuzzy
    }

    /// Answers `query` with up to `params.top_k` ranked candidates.
    ///
    /// Only corpus failures are errors. When the semantic tier gives no
    /// signal, fusion uses an effective alpha of `0`.
    #[instrument(skip(self, params), fields(query_len = query.len(), top_k = params.top_k))]
    pub async fn answer(&self, query: &str, params: &RetrievalParams) -> RetrievalResult<QueryAnswer> {
        let query = query.trim();
        if query.is_empty() {
            debug!("blank query");
            return Ok(QueryAnswer::empty());
        }
        let top_k = params.top_k.max(1);
        let corpus = self.corpus.as_ref();

        let count = corpus.count().await?;
        self.semantic.observe_corpus_count(count);

        let lexical_rows = lexical::search(corpus, query, top_k).await?;
        let semantic_hits = self.semantic.query(corpus, query, top_k).await?;

        let alpha = if semantic_hits.is_some() { params.alpha } else { 0.0 };
        let lexical_scores: Vec<ScoredCandidate> = lexical_rows
            .iter()
            .map(|r| ScoredCandidate::new(r.id, r.raw_score))
            .collect();
        let semantic_scores: ScoreMap = semantic_hits.unwrap_or_default().into_iter().collect();

        debug!(
            lexical = lexical_scores.len(),
            semantic = semantic_scores.len(),
            alpha,
            "fusing tiers"
        );

        let mut known: HashMap<i64, (String, String)> = lexical_rows
            .into_iter()
            .map(|LexicalRow { id, question, answer, .. }| (id, (question, answer)))
            .collect();

        let mut ranked = fuse(&lexical_scores, &semantic_scores, alpha);
        let mut path = AnswerPath::Fused;
        let mut scanned = false;

        if ranked.is_empty() {
            if !self.fuzzy.is_enabled() {
                return Ok(QueryAnswer::empty());
            }
            let records = corpus.full_scan().await?;
            ranked = self.fuzzy.rank(query, &records, top_k);
            known.extend(records.into_iter().map(|r| (r.id, (r.question, r.answer))));
            scanned = true;
            path = AnswerPath::Fuzzy;
            debug!(hits = ranked.len(), "fuzzy fallback");
        }

        ranked.truncate(top_k);
        if ranked.is_empty() {
            return Ok(QueryAnswer::empty());
        }

        if !scanned && ranked.iter().any(|c| !known.contains_key(&c.id)) {
            let records = corpus.full_scan().await?;
            known.extend(records.into_iter().map(|r| (r.id, (r.question, r.answer))));
        }

        let candidates: Vec<RankedResult> = ranked
            .into_iter()
            .filter_map(|c| {
                known.remove(&c.id).map(|(question, answer)| RankedResult {
                    id: c.id,
                    question,
                    answer,
                    score: c.score,
                })
            })
            .collect();

        if candidates.is_empty() {
            return Ok(QueryAnswer::empty());
        }

        let (tier, top_score) = classify_top(candidates.first().map(|c| c.score), params.high, params.low);
        info!(
            candidates = candidates.len(),
            top_id = candidates[0].id,
            top_score,
            %tier,
            ?path,
            "query answered"
        );

        Ok(QueryAnswer {
            candidates,
            tier,
            top_score,
            path,
        })
    }

    /// [`answer`](Self::answer) bounded by `timeout`.
    pub async fn answer_with_timeout(
        &self,
        query: &str,
        params: &RetrievalParams,
        timeout: Duration,
    ) -> RetrievalResult<QueryAnswer> {
        let started = Instant::now();
        tokio::time::timeout(timeout, self.answer(query, params))
            .await
            .map_err(|_| RetrievalError::Timeout {
                elapsed: started.elapsed(),
            })?
    }
}
