//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use wonk::corpus::{NewFaq, SqliteCorpus};
use wonk::embedding::{BackendPreference, EmbeddingBackend, EmbeddingConfig};
use wonk::retrieval::{FuzzyMatcher, QueryOrchestrator};
use wonk::config::Config;

pub const WONK_FAQS: &[(&str, &str)] = &[
    ("What is Wonk?", "Wonk is a local FAQ chatbot."),
    ("什么是 Wonk？", "Wonk 是一个本地运行的FAQ聊天机器人。"),
];

pub const SUPPORT_JSONL: &str = r#"{"question": "How do I reset my password?", "answer": "Use the reset link on the login page.", "tags": ["account"]}
{"question": "Where are invoices stored?", "answer": "Invoices live under Billing > History.", "tags": "billing, finance", "language": "en"}
{"question": "Can I export my data?", "answer": "Yes, from Settings > Export as CSV or JSON.", "source": "handbook"}

{"question": "no answer here"}
this line is not json
"#;

pub fn seeded_corpus(path: &Path) -> SqliteCorpus {
    let corpus = SqliteCorpus::open(path).expect("open corpus");
    let faqs: Vec<NewFaq> = WONK_FAQS.iter().map(|(q, a)| NewFaq::new(*q, *a)).collect();
    corpus.insert_faqs(&faqs).expect("seed corpus");
    corpus
}

pub fn write_jsonl(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("faqs.jsonl");
    let mut file = std::fs::File::create(&path).expect("create jsonl");
    file.write_all(contents.as_bytes()).expect("write jsonl");
    path
}

pub fn lexical_only(corpus: SqliteCorpus, fuzzy: bool) -> QueryOrchestrator<SqliteCorpus> {
    QueryOrchestrator::new(
        Arc::new(corpus),
        EmbeddingBackend::select(&EmbeddingConfig::disabled()),
        FuzzyMatcher::new(fuzzy),
    )
}

pub fn hashed_config(db_path: &Path) -> Config {
    Config {
        db_path: db_path.to_path_buf(),
        embedding_backend: BackendPreference::Hashed,
        hashed_dim: 256,
        ..Default::default()
    }
}
