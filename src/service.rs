//! Document service: the ingest and check flows.
//!
//! ```text
//! ingest:  raw text ─▶ normalize ─▶ chunk ─▶ embed/build ─▶ store.replace
//!                                                              │
//!                                         analyze + default checklist
//! check:   store.load ─▶ compliance(checklist)
//! ```
//!
//! Collaborators are injected, so the same service backs the CLI, the HTTP
//! server and tests with fake models.

use std::sync::Arc;

use crate::analyze::ClauseAnalyzer;
use crate::chunk::TextSplitter;
use crate::compliance::{check_compliance, default_checklist, load_checklist};
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::{Result, ReviewError};
use crate::index::VectorIndex;
use crate::llm::{create_model, LanguageModel};
use crate::models::{Checklist, ComplianceReport, IndexStatus, IngestOutcome};
use crate::normalize::{ensure_text, normalize_text};
use crate::store::{IndexStore, SqliteIndexStore};

pub struct DocumentService {
    config: Config,
    splitter: TextSplitter,
    provider: Arc<dyn EmbeddingProvider>,
    analyzer: ClauseAnalyzer,
    store: Arc<dyn IndexStore>,
    default_checklist: Checklist,
}

impl DocumentService {
    pub fn new(
        config: Config,
        provider: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn IndexStore>,
        default_checklist: Checklist,
    ) -> Result<Self> {
        let splitter = TextSplitter::from_config(&config.chunking)?;
        let analyzer = ClauseAnalyzer::from_config(llm, &config.analysis, &config.llm);
        Ok(Self {
            config,
            splitter,
            provider,
            analyzer,
            store,
            default_checklist,
        })
    }

    /// Wire up providers, the SQLite store and the default checklist from `config`.
    pub async fn from_config(config: Config) -> Result<Self> {
        let provider = create_provider(&config.embedding)?;
        let llm = create_model(&config.llm)?;
        let store: Arc<dyn IndexStore> = Arc::new(SqliteIndexStore::open(&config).await?);
        let checklist = match &config.compliance.default_checklist {
            Some(path) => load_checklist(path)?,
            None => default_checklist()?,
        };
        Self::new(config, provider, llm, store, checklist)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn default_checklist(&self) -> &Checklist {
        &self.default_checklist
    }

    /// Index a new document in place of the previous one, then analyze it
    /// and check it against the default checklist.
    pub async fn ingest(&self, raw_text: &str) -> Result<IngestOutcome> {
        ensure_text(raw_text)?;
        let text = normalize_text(raw_text);
        ensure_text(&text)?;

        let chunks = self.splitter.split(&text);
        tracing::info!(chunks = chunks.len(), chars = text.chars().count(), "document chunked");

        let index = VectorIndex::build(
            self.provider.as_ref(),
            &chunks,
            self.config.embedding.batch_size,
        )
        .await?;
        let index = self.store.replace(index).await?;
        tracing::info!(generation = index.generation(), "index published");

        let analysis = self.analyzer.analyze(&index, self.provider.as_ref()).await?;
        let compliance = check_compliance(
            Some(index.as_ref()),
            self.provider.as_ref(),
            &self.default_checklist,
            self.config.compliance.threshold,
        )
        .await?;

        tracing::info!(
            analyzed = analysis.clauses.len(),
            skipped = analysis.skipped,
            missing = compliance.missing().len(),
            "ingest complete"
        );

        Ok(IngestOutcome {
            generation: index.generation().to_string(),
            chunk_count: index.len(),
            analysis,
            compliance,
        })
    }

    /// Check the current document against `checklist` without re-indexing.
    pub async fn check(&self, checklist: &Checklist) -> Result<ComplianceReport> {
        let index = self.store.load().await?;
        check_compliance(
            index.as_deref(),
            self.provider.as_ref(),
            checklist,
            self.config.compliance.threshold,
        )
        .await
    }

    /// Status of the live index, if any.
    pub async fn status(&self) -> Result<Option<IndexStatus>> {
        Ok(self.store.load().await?.map(|index| index.status()))
    }

    /// Status of the live index, or [`ReviewError::NoIndex`].
    pub async fn require_status(&self) -> Result<IndexStatus> {
        self.status().await?.ok_or(ReviewError::NoIndex)
    }
}
