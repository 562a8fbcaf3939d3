//! SQLite corpus with an external-content FTS5 index.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use super::CorpusStore;
use super::error::{CorpusError, CorpusResult};
use super::types::{FaqRecord, LexicalRow, NewFaq, join_tags, split_tags};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS faqs (
    id INTEGER PRIMARY KEY,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    language TEXT DEFAULT 'auto',
    tags TEXT,
    source TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);";

const FTS_SCHEMA: &str = "
CREATE VIRTUAL TABLE IF NOT EXISTS faqs_fts USING fts5(
    question, answer, tags, content='faqs', content_rowid='id'
);
CREATE TRIGGER IF NOT EXISTS faqs_ai AFTER INSERT ON faqs BEGIN
    INSERT INTO faqs_fts(rowid, question, answer, tags)
    VALUES (new.id, new.question, new.answer, new.tags);
END;
CREATE TRIGGER IF NOT EXISTS faqs_ad AFTER DELETE ON faqs BEGIN
    INSERT INTO faqs_fts(faqs_fts, rowid, question, answer, tags)
    VALUES ('delete', old.id, old.question, old.answer, old.tags);
END;
CREATE TRIGGER IF NOT EXISTS faqs_au AFTER UPDATE ON faqs BEGIN
    INSERT INTO faqs_fts(faqs_fts, rowid, question, answer, tags)
    VALUES ('delete', old.id, old.question, old.answer, old.tags);
    INSERT INTO faqs_fts(rowid, question, answer, tags)
    VALUES (new.id, new.question, new.answer, new.tags);
END;";

const RECORD_COLUMNS: &str = "id, question, answer, language, tags, source";

/// SQLite-backed corpus.
///
/// If FTS5 cannot be created the store stays usable in substring-only mode.
/// [`CorpusStore`] calls run on the blocking pool so a slow query never stalls
/// a runtime worker and stays cancellable at its await point.
pub struct SqliteCorpus {
    conn: Arc<Mutex<Connection>>,
    fts_enabled: bool,
}

impl std::fmt::Debug for SqliteCorpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCorpus")
            .field("fts_enabled", &self.fts_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteCorpus {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> CorpusResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened corpus database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> CorpusResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> CorpusResult<Self> {
        conn.execute_batch(SCHEMA)?;

        let fts_enabled = match conn.execute_batch(FTS_SCHEMA) {
            Ok(()) => {
                info!("FTS5 index ready");
                true
            }
            Err(e) => {
                warn!(error = %e, "FTS5 not available, lexical search limited to substring matching");
                false
            }
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            fts_enabled,
        })
    }

    /// Whether the FTS5 index exists.
    pub fn has_full_text(&self) -> bool {
        self.fts_enabled
    }

    /// Inserts records in one transaction and returns their new ids.
    pub fn insert_faqs(&self, items: &[NewFaq]) -> CorpusResult<Vec<i64>> {
        for item in items {
            item.validate()?;
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(items.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO faqs (question, answer, language, tags, source) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for item in items {
                stmt.execute(params![
                    item.question,
                    item.answer,
                    item.language,
                    join_tags(&item.tags),
                    item.source,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;

        debug!(inserted = ids.len(), "inserted faqs");
        Ok(ids)
    }

    pub fn get(&self, id: i64) -> CorpusResult<Option<FaqRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM faqs WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Newest first.
    pub fn list(&self, limit: usize, offset: usize) -> CorpusResult<Vec<FaqRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM faqs ORDER BY id DESC LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn update(&self, id: i64, faq: &NewFaq) -> CorpusResult<()> {
        faq.validate()?;

        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE faqs SET question = ?1, answer = ?2, language = ?3, tags = ?4, source = ?5 WHERE id = ?6",
            params![
                faq.question,
                faq.answer,
                faq.language,
                join_tags(&faq.tags),
                faq.source,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(CorpusError::NotFound { id });
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> CorpusResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM faqs WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CorpusError::NotFound { id });
        }
        Ok(())
    }

    /// Rebuilds the FTS5 index from the content table.
    pub fn rebuild_full_text(&self) -> CorpusResult<()> {
        if !self.fts_enabled {
            return Err(CorpusError::IndexUnavailable {
                reason: "FTS5 index was not created".to_string(),
            });
        }

        let conn = self.conn.lock();
        conn.execute("INSERT INTO faqs_fts(faqs_fts) VALUES ('rebuild')", [])?;
        info!("FTS5 index rebuilt");
        Ok(())
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn blocking<T, F>(&self, op: &'static str, f: F) -> CorpusResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> CorpusResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| CorpusError::Unreachable {
                reason: format!("{op} task failed: {e}"),
            })?
    }
}

fn fts_search(conn: &Connection, match_expr: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT faqs.id, faqs.question, faqs.answer, bm25(faqs_fts) AS score
             FROM faqs_fts JOIN faqs ON faqs_fts.rowid = faqs.id
             WHERE faqs_fts MATCH ?1
             ORDER BY score, faqs.id
             LIMIT ?2",
        )
        .map_err(index_error)?;

    let rows = stmt
        .query_map(params![match_expr, limit as i64], |row| {
            Ok(LexicalRow {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                raw_score: row.get::<_, f64>(3)? as f32,
            })
        })
        .map_err(index_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(index_error)?;
    Ok(rows)
}

fn like_search(conn: &Connection, needle: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
    let pattern = format!("%{}%", escape_like(needle));

    let mut stmt = conn.prepare(
        "SELECT id, question, answer FROM faqs
         WHERE question LIKE ?1 ESCAPE '\\' OR answer LIKE ?1 ESCAPE '\\'
         ORDER BY id
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(LexicalRow {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                raw_score: 0.0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn scan(conn: &Connection) -> CorpusResult<Vec<FaqRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM faqs ORDER BY id ASC"
    ))?;
    let rows = stmt
        .query_map([], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn count_rows(conn: &Connection) -> CorpusResult<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM faqs", [], |r| r.get(0))?;
    Ok(n.max(0) as usize)
}

impl CorpusStore for SqliteCorpus {
    async fn lexical_raw_search(
        &self,
        match_expr: &str,
        limit: usize,
    ) -> CorpusResult<Vec<LexicalRow>> {
        if !self.fts_enabled {
            return Err(CorpusError::IndexUnavailable {
                reason: "FTS5 index was not created".to_string(),
            });
        }
        let match_expr = match_expr.to_string();
        self.blocking("full-text search", move |conn| fts_search(conn, &match_expr, limit))
            .await
    }

    async fn substring_search(&self, needle: &str, limit: usize) -> CorpusResult<Vec<LexicalRow>> {
        let needle = needle.to_string();
        self.blocking("substring search", move |conn| like_search(conn, &needle, limit))
            .await
    }

    async fn full_scan(&self) -> CorpusResult<Vec<FaqRecord>> {
        self.blocking("full scan", scan).await
    }

    async fn count(&self) -> CorpusResult<usize> {
        self.blocking("count", count_rows).await
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FaqRecord> {
    let tags: Option<String> = row.get(4)?;
    Ok(FaqRecord {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        language: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| crate::constants::DEFAULT_LANGUAGE.to_string()),
        tags: split_tags(tags.as_deref()),
        source: row.get(5)?,
    })
}

/// Maps "no such table" style failures to [`CorpusError::IndexUnavailable`].
fn index_error(err: rusqlite::Error) -> CorpusError {
    let message = err.to_string();
    if message.contains("no such table") || message.contains("no such module") {
        CorpusError::IndexUnavailable { reason: message }
    } else {
        CorpusError::Sqlite(err)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
