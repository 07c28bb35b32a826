//! # Contract review CLI (`crev`)
//!
//! ## Usage
//!
//! ```bash
//! crev --config ./config/review.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `crev init` | Create the SQLite database and schema |
//! | `crev ingest <file>` | Index a contract (PDF or text), analyze it, run the default checklist |
//! | `crev check <checklist.json>` | Check the indexed contract against a checklist |
//! | `crev status` | Show the current index |
//! | `crev serve` | Start the HTTP server |
//!
//! Logs go to stderr (`RUST_LOG` overrides the default filter), so
//! `--json` output on stdout can be piped.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use contract_review::compliance::{default_checklist, load_checklist};
use contract_review::config::{self, Config};
use contract_review::embedding::create_provider;
use contract_review::extract::{content_type_for_path, extract_text};
use contract_review::llm::DisabledModel;
use contract_review::models::{ComplianceReport, IngestOutcome};
use contract_review::server;
use contract_review::service::DocumentService;
use contract_review::store::{IndexStore, SqliteIndexStore};

/// Contract review: clause analysis and compliance checks for contracts.
#[derive(Parser)]
#[command(name = "crev", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/review.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema. Idempotent.
    Init,

    /// Index a contract in place of the current one.
    ///
    /// Files ending in `.pdf` are read as PDF, anything else as UTF-8 text.
    Ingest {
        file: PathBuf,

        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check the indexed contract against a checklist file.
    Check {
        checklist: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show the current index.
    Status,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_review=info,crev=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            SqliteIndexStore::open(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file, json } => {
            let text = read_document(&file)?;
            let service = DocumentService::from_config(cfg).await?;
            let outcome = service.ingest(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_ingest(&outcome);
            }
        }
        Commands::Check { checklist, json } => {
            let checklist = load_checklist(&checklist)?;
            let service = checking_service(cfg).await?;
            let report = service.check(&checklist).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Status => {
            let store = SqliteIndexStore::open(&cfg).await?;
            match store.load().await? {
                Some(index) => {
                    let status = index.status();
                    println!("Generation:  {}", status.generation);
                    println!("Model:       {} ({} dims)", status.model, status.dims);
                    println!("Chunks:      {}", status.chunk_count);
                    println!("Created at:  {}", status.created_at);
                }
                None => println!("No document has been ingested yet."),
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(extract_text(&bytes, content_type_for_path(path))?)
}

/// A service for compliance checks only; no language model is needed.
async fn checking_service(cfg: Config) -> anyhow::Result<DocumentService> {
    let provider = create_provider(&cfg.embedding)?;
    let store: Arc<dyn IndexStore> = Arc::new(SqliteIndexStore::open(&cfg).await?);
    let checklist = default_checklist()?;
    Ok(DocumentService::new(
        cfg,
        provider,
        Arc::new(DisabledModel),
        store,
        checklist,
    )?)
}

fn print_ingest(outcome: &IngestOutcome) {
    println!(
        "Indexed {} chunks (generation {}).",
        outcome.chunk_count, outcome.generation
    );
    println!();

    if outcome.analysis.clauses.is_empty() {
        println!("No clauses analyzed.");
    }
    for (i, clause) in outcome.analysis.clauses.iter().enumerate() {
        println!("{}. [{}]", i + 1, clause.clause_type);
        println!("   {}", excerpt(&clause.original_text));
        println!("   Summary: {}", clause.summary);
        println!("   Questions: {}", clause.risk_questions);
        println!("   Improvements: {}", clause.suggested_improvements);
        println!();
    }
    if outcome.analysis.skipped > 0 {
        println!(
            "{} clause(s) skipped after analysis errors.",
            outcome.analysis.skipped
        );
        println!();
    }

    println!("Default checklist:");
    print_report(&outcome.compliance);
}

fn print_report(report: &ComplianceReport) {
    for result in &report.results {
        let score = result
            .best_match_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        let mark = if result.found { "found  " } else { "MISSING" };
        println!("  {} {:<28} score {}", mark, result.name, score);
    }
    let missing = report.missing();
    println!(
        "{} of {} required clauses missing.",
        missing.len(),
        report.results.len()
    );
}

fn excerpt(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    match line.char_indices().nth(100) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
