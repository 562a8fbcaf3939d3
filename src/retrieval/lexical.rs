//! Lexical tier: FTS5 BM25 search with a substring fallback.

use tracing::{debug, warn};

use crate::corpus::{CorpusError, CorpusResult, CorpusStore, LexicalRow};

/// Builds an FTS5 MATCH expression: lower-cased alphanumeric tokens, each
/// quoted, de-duplicated in order and OR-ed. `None` if there are no tokens.
pub fn fts_match_expression(query: &str) -> Option<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    if tokens.is_empty() {
        return None;
    }

    Some(
        tokens
            .iter()
            .map(|t| format!("\"{t}\""))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

/// Runs the lexical tier. Rows come back best first; substring hits all
/// carry raw score `0.0`.
///
/// A missing full-text index or an empty FTS result falls back to substring
/// search. Other store errors propagate.
pub async fn search<S: CorpusStore>(
    corpus: &S,
    query: &str,
    top_k: usize,
) -> CorpusResult<Vec<LexicalRow>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let top_k = top_k.max(1);

    if let Some(expr) = fts_match_expression(query) {
        match corpus.lexical_raw_search(&expr, top_k).await {
            Ok(rows) if !rows.is_empty() => {
                debug!(hits = rows.len(), "full-text search hits");
                return Ok(rows);
            }
            Ok(_) => debug!("no full-text hits, trying substring search"),
            Err(CorpusError::IndexUnavailable { reason }) => {
                warn!(reason = %reason, "full-text index unavailable, using substring search");
            }
            Err(e) => return Err(e),
        }
    }

    let rows = corpus.substring_search(query, top_k).await?;
    debug!(hits = rows.len(), "substring search hits");
    Ok(rows)
}
