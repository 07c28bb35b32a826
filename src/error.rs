//! Error taxonomy for the review pipeline.
//!
//! Every failure that leaves the core carries a stable [`ReviewError::kind`]
//! code so callers (CLI, HTTP) can branch on it: "no document yet" and
//! "malformed checklist" need different remediation than an internal fault.
//!
//! | Variant | Code | Surfaced |
//! |---------|------|----------|
//! | [`Extraction`](ReviewError::Extraction) | `extraction_failed` | rejected input |
//! | [`IndexBuild`](ReviewError::IndexBuild) | `index_build_failed` | fatal for the ingest |
//! | [`NoIndex`](ReviewError::NoIndex) | `not_found` | "not found" |
//! | [`AnalysisStep`](ReviewError::AnalysisStep) | `analysis_step_failed` | never; counted as skipped |
//! | [`ChecklistFormat`](ReviewError::ChecklistFormat) | `invalid_checklist` | rejected input |
//! | [`Config`](ReviewError::Config) | `invalid_config` | startup failure |
//! | [`Internal`](ReviewError::Internal) | `internal` | generic server failure |

use thiserror::Error;

/// Result alias used at the core boundary.
pub type Result<T> = std::result::Result<T, ReviewError>;

#[derive(Error, Debug)]
pub enum ReviewError {
    /// Raw input text is empty or could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// An index was requested from zero chunks.
    #[error("index build failed: {0}")]
    IndexBuild(String),

    /// A compliance check ran before any document was ingested.
    #[error("no document has been ingested yet")]
    NoIndex,

    /// One language-model call for one chunk failed.
    #[error("analysis step '{step}' failed: {message}")]
    AnalysisStep { step: &'static str, message: String },

    /// Checklist payload is missing required fields.
    #[error("invalid checklist: {0}")]
    ChecklistFormat(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ReviewError {
    /// Stable machine-readable code for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            ReviewError::Extraction(_) => "extraction_failed",
            ReviewError::IndexBuild(_) => "index_build_failed",
            ReviewError::NoIndex => "not_found",
            ReviewError::AnalysisStep { .. } => "analysis_step_failed",
            ReviewError::ChecklistFormat(_) => "invalid_checklist",
            ReviewError::Config(_) => "invalid_config",
            ReviewError::Internal(_) => "internal",
        }
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReviewError::Extraction(_) | ReviewError::ChecklistFormat(_) | ReviewError::NoIndex
        )
    }
}

impl From<sqlx::Error> for ReviewError {
    fn from(e: sqlx::Error) -> Self {
        ReviewError::Internal(e.into())
    }
}

impl From<std::io::Error> for ReviewError {
    fn from(e: std::io::Error) -> Self {
        ReviewError::Internal(e.into())
    }
}
