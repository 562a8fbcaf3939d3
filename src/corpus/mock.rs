//! In-memory corpus for tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::CorpusStore;
use super::error::{CorpusError, CorpusResult};
use super::types::{FaqRecord, LexicalRow, NewFaq};

/// In-memory [`CorpusStore`].
///
/// Lexical search scores a record by the negated number of query tokens it
/// contains, so more overlap means a lower (better) cost.
#[derive(Default, Clone)]
pub struct MockCorpusStore {
    records: Arc<RwLock<BTreeMap<i64, FaqRecord>>>,
    next_id: Arc<AtomicUsize>,
    fts_disabled: Arc<AtomicBool>,
    unreachable: Arc<AtomicBool>,
    full_scans: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockCorpusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCorpusStore")
            .field("records", &self.len())
            .field("fts_disabled", &self.fts_disabled.load(Ordering::Relaxed))
            .field("unreachable", &self.unreachable.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faqs(items: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (q, a) in items {
            store.insert(NewFaq::new(*q, *a));
        }
        store
    }

    pub fn insert(&self, faq: NewFaq) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        self.records.write().insert(id, faq.into_record(id));
        id
    }

    pub fn remove(&self, id: i64) -> bool {
        self.records.write().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Makes `lexical_raw_search` fail with `IndexUnavailable`.
    pub fn set_full_text_available(&self, available: bool) {
        self.fts_disabled.store(!available, Ordering::SeqCst);
    }

    /// Makes every operation fail with `Unreachable`.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of `full_scan` calls so far.
    pub fn full_scan_count(&self) -> usize {
        self.full_scans.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> CorpusResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(CorpusError::Unreachable {
                reason: "mock store offline".to_string(),
            });
        }
        Ok(())
    }
}

/// Pulls the quoted terms out of a `"a" OR "b"` match expression.
fn match_terms(match_expr: &str) -> Vec<String> {
    match_expr
        .split('"')
        .skip(1)
        .step_by(2)
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty())
        .collect()
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl CorpusStore for MockCorpusStore {
    async fn lexical_raw_search(
        &self,
        match_expr: &str,
        limit: usize,
    ) -> CorpusResult<Vec<LexicalRow>> {
        self.check_reachable()?;
        if self.fts_disabled.load(Ordering::SeqCst) {
            return Err(CorpusError::IndexUnavailable {
                reason: "mock full-text index disabled".to_string(),
            });
        }

        let terms = match_terms(match_expr);
        let mut rows: Vec<LexicalRow> = self
            .records
            .read()
            .values()
            .filter_map(|r| {
                let mut doc = words(&r.question);
                doc.extend(words(&r.answer));
                let hits = terms.iter().filter(|t| doc.contains(t)).count();
                (hits > 0).then(|| LexicalRow {
                    id: r.id,
                    question: r.question.clone(),
                    answer: r.answer.clone(),
                    raw_score: -(hits as f32),
                })
            })
            .collect();

        rows.sort_by(|a, b| a.raw_score.total_cmp(&b.raw_score).then(a.id.cmp(&b.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn substring_search(&self, needle: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
        self.check_reachable()?;

        let needle = needle.to_lowercase();
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| {
                r.question.to_lowercase().contains(&needle)
                    || r.answer.to_lowercase().contains(&needle)
            })
            .take(limit)
            .map(|r| LexicalRow {
                id: r.id,
                question: r.question.clone(),
                answer: r.answer.clone(),
                raw_score: 0.0,
            })
            .collect())
    }

    async fn full_scan(&self) -> CorpusResult<Vec<FaqRecord>> {
        self.check_reachable()?;
        self.full_scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.read().values().cloned().collect())
    }

    async fn count(&self) -> CorpusResult<usize> {
        self.check_reachable()?;
        Ok(self.len())
    }
}
