//! Core data models flowing through the review pipeline.
//!
//! Results ([`ClauseAnalysis`], [`ComplianceResult`]) hold copied text, never
//! references into a [`VectorIndex`](crate::index::VectorIndex), so they stay
//! valid after that index is replaced.

use serde::{Deserialize, Serialize};

/// A chunk of normalized document text with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position within the document, starting at 0.
    pub sequence_index: usize,
    pub text: String,
    /// SHA-256 of `text`, checked when a persisted index is loaded.
    pub hash: String,
    pub embedding: Vec<f32>,
}

/// One required clause of a checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub name: String,
    pub text: String,
}

/// Ordered list of required clauses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Checklist {
    pub required_clauses: Vec<ChecklistEntry>,
}

/// Language-model analysis of one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub original_text: String,
    pub clause_type: String,
    pub summary: String,
    pub risk_questions: String,
    pub suggested_improvements: String,
}

/// Output of the clause analyzer for one ingest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Successfully analyzed chunks, in retrieval order.
    pub clauses: Vec<ClauseAnalysis>,
    /// Chunks dropped because one of their analysis steps failed.
    pub skipped: usize,
}

/// Outcome of matching one checklist entry against the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub name: String,
    pub expected_text: String,
    pub found: bool,
    /// Score of the closest chunk; `None` when the index returned nothing.
    pub best_match_score: Option<f32>,
    /// Excerpt of the closest chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
}

pub const MISSING_REASON: &str = "missing or insufficiently similar";

/// Externally reported shape of a missing clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingClause {
    pub name: String,
    pub expected_text: String,
    pub reason: String,
}

impl From<&ComplianceResult> for MissingClause {
    fn from(r: &ComplianceResult) -> Self {
        MissingClause {
            name: r.name.clone(),
            expected_text: r.expected_text.clone(),
            reason: MISSING_REASON.to_string(),
        }
    }
}

/// Per-entry results of one compliance check, in checklist order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceReport {
    pub results: Vec<ComplianceResult>,
}

impl ComplianceReport {
    /// Entries with `found = false`, checklist order preserved.
    pub fn missing(&self) -> Vec<MissingClause> {
        self.results
            .iter()
            .filter(|r| !r.found)
            .map(MissingClause::from)
            .collect()
    }

    pub fn all_found(&self) -> bool {
        self.results.iter().all(|r| r.found)
    }
}

/// Everything produced by one document ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub generation: String,
    pub chunk_count: usize,
    pub analysis: AnalysisReport,
    pub compliance: ComplianceReport,
}

/// Summary of the live index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub generation: String,
    pub model: String,
    pub dims: usize,
    pub chunk_count: usize,
    /// ISO 8601 build time.
    pub created_at: String,
}
