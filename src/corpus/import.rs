//! JSONL bulk import.
//!
//! One JSON object per line: `question` and `answer` are required; `language`,
//! `tags` (array or comma-separated string) and `source` are optional.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::error::{CorpusError, CorpusResult};
use super::sqlite::SqliteCorpus;
use super::types::{NewFaq, split_tags};

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

#[derive(Debug, Deserialize)]
struct RawFaq {
    question: Option<String>,
    answer: Option<String>,
    language: Option<String>,
    tags: Option<RawTags>,
    source: Option<String>,
}

impl RawFaq {
    fn into_new_faq(self) -> Option<NewFaq> {
        let question = self.question.filter(|q| !q.trim().is_empty())?;
        let answer = self.answer.filter(|a| !a.trim().is_empty())?;

        let tags: BTreeSet<String> = match self.tags {
            Some(RawTags::List(list)) => list
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Some(RawTags::Joined(joined)) => split_tags(Some(&joined)),
            None => BTreeSet::new(),
        };

        let mut faq = NewFaq::new(question.trim(), answer.trim()).with_tags(tags);
        if let Some(language) = self.language.filter(|l| !l.trim().is_empty()) {
            faq = faq.with_language(language.trim());
        }
        if let Some(source) = self.source.filter(|s| !s.trim().is_empty()) {
            faq = faq.with_source(source.trim());
        }
        Some(faq)
    }
}

/// Parses JSONL text. Returns the valid records and the number of skipped lines.
pub fn parse_jsonl(input: &str) -> (Vec<NewFaq>, usize) {
    let mut faqs = Vec::new();
    let mut skipped = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<RawFaq>(line).map(RawFaq::into_new_faq) {
            Ok(Some(faq)) => faqs.push(faq),
            Ok(None) => {
                debug!(line = index + 1, "skipping record without question or answer");
                skipped += 1;
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping malformed line");
                skipped += 1;
            }
        }
    }

    (faqs, skipped)
}

/// Imports a JSONL file into the corpus, then rebuilds the full-text index.
pub fn import_jsonl(corpus: &SqliteCorpus, path: impl AsRef<Path>) -> CorpusResult<ImportReport> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)?;
    let (faqs, skipped) = parse_jsonl(&input);

    let inserted = if faqs.is_empty() {
        0
    } else {
        corpus.insert_faqs(&faqs)?.len()
    };

    match corpus.rebuild_full_text() {
        Ok(()) | Err(CorpusError::IndexUnavailable { .. }) => {}
        Err(e) => return Err(e),
    }

    info!(path = %path.display(), inserted, skipped, "import finished");
    Ok(ImportReport { inserted, skipped })
}
