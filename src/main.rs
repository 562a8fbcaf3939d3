//! Wonk command-line entrypoint.
//!
//! ```text
//! wonk ask <question> [--top-k N]
//! wonk import <file.jsonl>
//! wonk stats
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use serde::Serialize;
use uuid::Uuid;

use wonk::config::Config;
use wonk::constants::MAX_TOP_K;
use wonk::corpus::{CorpusStore, SqliteCorpus, import_jsonl};
use wonk::embedding::EmbeddingBackend;
use wonk::retrieval::{QueryAnswer, QueryOrchestrator};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "wonk", version, about = "Answer questions from a local FAQ corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Answer a question and print the ranked candidates as JSON
    Ask {
        /// Question text; multiple words are joined with spaces
        #[arg(required = true)]
        question: Vec<String>,

        /// Number of candidates to return (defaults to WONK_TOP_K)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TOP_K as u64))]
        top_k: Option<u64>,
    },
    /// Import FAQ records from a JSONL file
    Import { path: PathBuf },
    /// Print corpus and embedding backend statistics
    Stats,
}

#[derive(Serialize)]
struct AskOutput<'a> {
    trace_id: String,
    query: &'a str,
    #[serde(flatten)]
    answer: &'a QueryAnswer,
}

#[derive(Serialize)]
struct StatsOutput {
    records: usize,
    full_text: bool,
    embedding_backend: &'static str,
    embedding_dimension: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let corpus = SqliteCorpus::open(&config.db_path)
        .with_context(|| format!("opening corpus at {}", config.db_path.display()))?;

    match cli.command {
        Command::Ask { question, top_k } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                bail!("question must not be blank");
            }
            let trace_id = Uuid::new_v4().to_string();
            let mut params = config.retrieval_params();
            if let Some(top_k) = top_k {
                params = params.with_top_k(top_k as usize);
            }

            let orchestrator = QueryOrchestrator::from_config(Arc::new(corpus), &config);
            let answer = orchestrator
                .answer_with_timeout(&question, &params, config.query_timeout)
                .await?;

            tracing::info!(trace_id = %trace_id, tier = %answer.tier, "answered");
            let output = AskOutput {
                trace_id,
                query: &question,
                answer: &answer,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Import { path } => {
            let report = import_jsonl(&corpus, &path)
                .with_context(|| format!("importing {}", path.display()))?;
            println!("inserted {} record(s), skipped {} line(s)", report.inserted, report.skipped);
        }
        Command::Stats => {
            let backend = EmbeddingBackend::select(&config.embedding_config());
            let stats = StatsOutput {
                records: corpus.count().await?,
                full_text: corpus.has_full_text(),
                embedding_backend: backend.name(),
                embedding_dimension: backend.dimension(),
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
