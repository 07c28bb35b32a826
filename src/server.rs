//! HTTP server.
//!
//! A thin JSON/multipart surface over [`DocumentService`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload-pdf` | Upload a contract (multipart field `file`), index, analyze and check it |
//! | `POST` | `/check-compliance` | Check the current contract against a JSON checklist |
//! | `GET`  | `/index` | Status of the current index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "no document has been ingested yet" } }
//! ```
//!
//! Error codes: `invalid_file_type` (400), `extraction_failed` (400),
//! `invalid_checklist` (400), `bad_request` (400), `not_found` (404),
//! `index_build_failed` (500), `invalid_config` (500), `internal` (500).

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ReviewError;
use crate::extract::{extract_text, is_supported, MIME_PDF, MIME_TEXT};
use crate::models::{Checklist, ClauseAnalysis, IndexStatus, MissingClause};
use crate::service::DocumentService;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

type AppState = Arc<DocumentService>;

/// Build the router over an already wired service.
pub fn build_router(service: Arc<DocumentService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload-pdf", post(handle_upload))
        .route("/upload-pdf/", post(handle_upload))
        .route("/check-compliance", post(handle_check))
        .route("/check-compliance/", post(handle_check))
        .route("/index", get(handle_index))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let service = Arc::new(DocumentService::from_config(config.clone()).await?);
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("contract review server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        let status = match &err {
            ReviewError::NoIndex => StatusCode::NOT_FOUND,
            ReviewError::Extraction(_) | ReviewError::ChecklistFormat(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = ?err, "request failed");
        }
        AppError {
            status,
            code: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

fn bad_request(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: code.to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /index ============

async fn handle_index(State(service): State<AppState>) -> Result<Json<IndexStatus>, AppError> {
    Ok(Json(service.require_status().await?))
}

// ============ POST /upload-pdf ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    generation: String,
    chunk_count: usize,
    analysis_results: Vec<ClauseAnalysis>,
    skipped_clauses: usize,
    default_compliance_check: Vec<MissingClause>,
}

/// Accepts `application/pdf` or `text/plain`. When the part carries no
/// content type, a `.pdf` file name selects PDF.
async fn handle_upload(
    State(service): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request("bad_request", format!("multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = match field.content_type() {
            Some(ct) => ct.to_string(),
            None => match field.file_name() {
                Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => MIME_PDF.to_string(),
                _ => MIME_TEXT.to_string(),
            },
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| bad_request("bad_request", format!("failed to read file: {}", e)))?;
        upload = Some((content_type, data));
        break;
    }

    let (content_type, data) =
        upload.ok_or_else(|| bad_request("bad_request", "missing multipart field 'file'"))?;

    if !is_supported(&content_type) {
        return Err(bad_request(
            "invalid_file_type",
            format!(
                "invalid file type '{}'; upload a PDF or plain-text file",
                content_type
            ),
        ));
    }

    tracing::info!(bytes = data.len(), content_type = %content_type, "upload received");

    let text = tokio::task::spawn_blocking(move || extract_text(&data, &content_type))
        .await
        .map_err(|e| ReviewError::Internal(e.into()))??;

    let outcome = service.ingest(&text).await?;

    Ok(Json(UploadResponse {
        message: "Document processed and analyzed.".to_string(),
        generation: outcome.generation,
        chunk_count: outcome.chunk_count,
        skipped_clauses: outcome.analysis.skipped,
        default_compliance_check: outcome.compliance.missing(),
        analysis_results: outcome.analysis.clauses,
    }))
}

// ============ POST /check-compliance ============

#[derive(Serialize)]
struct CheckResponse {
    status: String,
    missing_clauses: Vec<MissingClause>,
}

/// The body is parsed here rather than by the `Json` extractor so that
/// malformed checklists get the `invalid_checklist` code.
async fn handle_check(
    State(service): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckResponse>, AppError> {
    let raw = std::str::from_utf8(&body)
        .map_err(|_| ReviewError::ChecklistFormat("body is not UTF-8".to_string()))?;
    let checklist = Checklist::from_json_str(raw)?;

    let report = service.check(&checklist).await?;

    Ok(Json(CheckResponse {
        status: "success".to_string(),
        missing_clauses: report.missing(),
    }))
}
