use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::{CorpusError, CorpusResult};
use crate::constants::DEFAULT_LANGUAGE;

/// One curated question/answer entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub language: String,
    pub tags: BTreeSet<String>,
    pub source: Option<String>,
}

impl FaqRecord {
    /// Text fed to the embedder for this record.
    pub fn semantic_text(&self) -> String {
        format!("{}\n{}", self.question, self.answer)
    }
}

/// Ingestion shape for a record that has no id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFaq {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl NewFaq {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            language: default_language(),
            tags: BTreeSet::new(),
            source: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Rejects blank questions or answers.
    pub fn validate(&self) -> CorpusResult<()> {
        if self.question.trim().is_empty() {
            return Err(CorpusError::InvalidRecord {
                reason: "question is empty".to_string(),
            });
        }
        if self.answer.trim().is_empty() {
            return Err(CorpusError::InvalidRecord {
                reason: "answer is empty".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn into_record(self, id: i64) -> FaqRecord {
        FaqRecord {
            id,
            question: self.question,
            answer: self.answer,
            language: self.language,
            tags: self.tags,
            source: self.source,
        }
    }
}

/// A lexical hit. Lower `raw_score` is better; substring hits carry `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalRow {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub raw_score: f32,
}

/// Joins tags into the comma-separated storage form.
pub fn join_tags(tags: &BTreeSet<String>) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.iter().cloned().collect::<Vec<_>>().join(","))
    }
}

/// Splits the comma-separated storage form back into a tag set.
pub fn split_tags(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
