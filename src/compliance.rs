//! Compliance matching of a checklist against the live index.
//!
//! Each checklist entry's expected text is used as a similarity query with
//! `k = 1`. The entry counts as found when the best chunk scores at least
//! the threshold (cosine similarity, default 0.7).
//!
//! Checklists arrive as untyped JSON (request bodies, files on disk) and are
//! validated here before any query runs.

use serde_json::Value;
use std::path::Path;

use crate::embedding::EmbeddingProvider;
use crate::error::{Result, ReviewError};
use crate::index::VectorIndex;
use crate::models::{Checklist, ChecklistEntry, ComplianceReport, ComplianceResult};

const DEFAULT_CHECKLIST_JSON: &str = include_str!("../config/default_checklist.json");

/// Characters of the matched chunk kept in a [`ComplianceResult`].
const SNIPPET_CHARS: usize = 160;

impl Checklist {
    /// Validate an untyped checklist payload.
    ///
    /// Expects `{"required_clauses": [{"name": "...", "text": "..."}, ...]}`
    /// with non-empty string fields. Unknown extra fields are ignored.
    pub fn from_json(value: &Value) -> Result<Self> {
        let clauses = value
            .get("required_clauses")
            .ok_or_else(|| ReviewError::ChecklistFormat("missing 'required_clauses'".to_string()))?
            .as_array()
            .ok_or_else(|| {
                ReviewError::ChecklistFormat("'required_clauses' must be an array".to_string())
            })?;

        let mut required_clauses = Vec::with_capacity(clauses.len());
        for (i, entry) in clauses.iter().enumerate() {
            let name = string_field(entry, "name", i)?;
            let text = string_field(entry, "text", i)?;
            required_clauses.push(ChecklistEntry { name, text });
        }

        Ok(Checklist { required_clauses })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ReviewError::ChecklistFormat(format!("not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }
}

fn string_field(entry: &Value, field: &str, position: usize) -> Result<String> {
    match entry.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ReviewError::ChecklistFormat(format!(
            "required_clauses[{}].{} is empty",
            position, field
        ))),
        Some(_) => Err(ReviewError::ChecklistFormat(format!(
            "required_clauses[{}].{} must be a string",
            position, field
        ))),
        None => Err(ReviewError::ChecklistFormat(format!(
            "required_clauses[{}] is missing '{}'",
            position, field
        ))),
    }
}

/// Read and validate a checklist file.
pub fn load_checklist(path: &Path) -> Result<Checklist> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ReviewError::ChecklistFormat(format!("cannot read {}: {}", path.display(), e))
    })?;
    Checklist::from_json_str(&raw)
}

/// The checklist shipped with the binary.
pub fn default_checklist() -> Result<Checklist> {
    Checklist::from_json_str(DEFAULT_CHECKLIST_JSON)
}

/// Match every checklist entry against `index`.
///
/// Fails with [`ReviewError::NoIndex`] when no document has been ingested.
/// Results follow checklist order.
pub async fn check_compliance(
    index: Option<&VectorIndex>,
    provider: &dyn EmbeddingProvider,
    checklist: &Checklist,
    threshold: f32,
) -> Result<ComplianceReport> {
    let index = index.ok_or(ReviewError::NoIndex)?;

    let mut results = Vec::with_capacity(checklist.required_clauses.len());
    for entry in &checklist.required_clauses {
        let best = index.query(provider, &entry.text, 1).await?.into_iter().next();

        let result = match best {
            Some(hit) if hit.score >= threshold => {
                tracing::debug!(
                    clause = %entry.name,
                    score = hit.score,
                    chunk = hit.sequence_index,
                    "clause found"
                );
                ComplianceResult {
                    name: entry.name.clone(),
                    expected_text: entry.text.clone(),
                    found: true,
                    best_match_score: Some(hit.score),
                    matched_text: Some(snippet(&hit.text)),
                }
            }
            Some(hit) => {
                tracing::debug!(clause = %entry.name, score = hit.score, "clause below threshold");
                ComplianceResult {
                    name: entry.name.clone(),
                    expected_text: entry.text.clone(),
                    found: false,
                    best_match_score: Some(hit.score),
                    matched_text: Some(snippet(&hit.text)),
                }
            }
            None => ComplianceResult {
                name: entry.name.clone(),
                expected_text: entry.text.clone(),
                found: false,
                best_match_score: None,
                matched_text: None,
            },
        };
        results.push(result);
    }

    Ok(ComplianceReport { results })
}

fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
