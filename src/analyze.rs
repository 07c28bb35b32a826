//! Clause analyzer.
//!
//! Retrieves up to `max_clauses` chunks with a fixed probe query and runs
//! each through four language-model steps: classify, then summarize, risk
//! questions and improvements with the classification threaded in.
//!
//! The probe is an approximation: it returns the chunks most similar to a
//! generic description of "clauses", not every clause. Documents with more
//! chunks than the cap have some clauses unanalyzed.
//!
//! Chunks are analyzed concurrently, at most `concurrency` at a time. A
//! failed or timed-out step drops that chunk only; the report counts it in
//! `skipped` and keeps the other chunks in retrieval order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{AnalysisConfig, LlmConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, ReviewError};
use crate::index::VectorIndex;
use crate::llm::LanguageModel;
use crate::models::{AnalysisReport, ClauseAnalysis};
use crate::prompts;

pub struct ClauseAnalyzer {
    llm: Arc<dyn LanguageModel>,
    max_clauses: usize,
    probe: String,
    concurrency: usize,
    call_timeout: Option<Duration>,
}

impl ClauseAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self::from_config(llm, &AnalysisConfig::default(), &LlmConfig::default())
    }

    pub fn from_config(
        llm: Arc<dyn LanguageModel>,
        analysis: &AnalysisConfig,
        llm_config: &LlmConfig,
    ) -> Self {
        Self {
            llm,
            max_clauses: analysis.max_clauses,
            probe: analysis.probe.clone(),
            concurrency: analysis.concurrency.max(1),
            call_timeout: match llm_config.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn with_max_clauses(mut self, max_clauses: usize) -> Self {
        self.max_clauses = max_clauses;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Analyze the chunks of `index` that best match the probe.
    ///
    /// Only retrieval errors fail the whole call; language-model failures
    /// are absorbed into `skipped`.
    pub async fn analyze(
        &self,
        index: &VectorIndex,
        provider: &dyn EmbeddingProvider,
    ) -> Result<AnalysisReport> {
        let hits = index.query(provider, &self.probe, self.max_clauses).await?;
        tracing::info!(
            chunks = hits.len(),
            model = self.llm.name(),
            "analyzing clauses"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (position, hit) in hits.into_iter().enumerate() {
            let llm = self.llm.clone();
            let semaphore = semaphore.clone();
            let timeout = self.call_timeout;
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = analyze_chunk(llm.as_ref(), hit.text, timeout).await;
                (position, hit.sequence_index, outcome)
            });
        }

        let mut analyzed: Vec<(usize, ClauseAnalysis)> = Vec::new();
        let mut skipped = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, _, Ok(analysis))) => analyzed.push((position, analysis)),
                Ok((_, sequence_index, Err(e))) => {
                    tracing::warn!(chunk = sequence_index, error = %e, "skipping clause");
                    skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "clause analysis task aborted");
                    skipped += 1;
                }
            }
        }

        analyzed.sort_by_key(|(position, _)| *position);

        Ok(AnalysisReport {
            clauses: analyzed.into_iter().map(|(_, a)| a).collect(),
            skipped,
        })
    }
}

/// Run the four steps for one chunk, stopping at the first failure.
async fn analyze_chunk(
    llm: &dyn LanguageModel,
    text: String,
    timeout: Option<Duration>,
) -> Result<ClauseAnalysis> {
    let mut vars = BTreeMap::new();
    vars.insert("clause_text", text);

    let clause_type = run_step(llm, "classify", prompts::CLASSIFY, &vars, timeout).await?;
    vars.insert("clause_type", clause_type.clone());

    let summary = run_step(llm, "summarize", prompts::SUMMARIZE, &vars, timeout).await?;
    let risk_questions =
        run_step(llm, "risk_questions", prompts::RISK_QUESTIONS, &vars, timeout).await?;
    let suggested_improvements =
        run_step(llm, "improvements", prompts::IMPROVEMENTS, &vars, timeout).await?;

    Ok(ClauseAnalysis {
        original_text: vars.remove("clause_text").unwrap_or_default(),
        clause_type,
        summary,
        risk_questions,
        suggested_improvements,
    })
}

async fn run_step(
    llm: &dyn LanguageModel,
    step: &'static str,
    template: &str,
    vars: &BTreeMap<&str, String>,
    timeout: Option<Duration>,
) -> Result<String> {
    let call = llm.ask(template, vars);
    let answer = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(answer) => answer,
            Err(_) => {
                return Err(ReviewError::AnalysisStep {
                    step,
                    message: format!("timed out after {}s", limit.as_secs_f32()),
                })
            }
        },
        None => call.await,
    };
    answer.map_err(|e| ReviewError::AnalysisStep {
        step,
        message: e.to_string(),
    })
}
