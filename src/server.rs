//! HTTP service.
//!
//! Exposes the pipeline as a JSON HTTP API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ai` | Raw LLM query, no retrieval |
//! | `POST` | `/ask_pdf` | Question answering against the ingested corpus |
//! | `POST` | `/pdf` | Multipart upload of a PDF or CSV file |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Each request is stateless end-to-end except for the side effect of
//! appending to the vector store. The LLM client and embedding provider
//! are created once at startup and shared across handlers; the store
//! handle is reopened per request.
//!
//! Error contract: an unsupported upload extension yields
//! `{"error": "Unsupported file type. Please upload PDF or CSV files only."}`
//! with status 400. Every other pipeline failure bubbles up untranslated
//! and surfaces as an opaque 500.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::chain;
use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::ingest;
use crate::llm::LlmClient;
use crate::loader::FileKind;

const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type. Please upload PDF or CSV files only.";

/// Uploads can be large; the axum default of 2 MB is too small for PDFs.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor. Model handles are process-wide; only the vector
/// store is reopened per request.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    llm: Arc<LlmClient>,
    embedder: Arc<dyn EmbeddingProvider>,
}

/// Build the router with freshly constructed model handles.
///
/// Separated from [`run_server`] so tests can bind their own listener.
pub fn build_app(config: Arc<Config>) -> anyhow::Result<Router> {
    let llm = Arc::new(LlmClient::new(&config.llm));
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);

    let state = AppState {
        config,
        llm,
        embedder,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/ai", post(handle_raw_query))
        .route("/ask_pdf", post(handle_ask))
        .route("/pdf", post(handle_upload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state))
}

/// Starts the HTTP server on the configured bind address and runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_app(Arc::new(config.clone()))?;

    info!("askdocs listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// Internal error type that converts into an Axum HTTP response with a
/// JSON `{"error": ...}` body.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Opaque 500. Details go to the log, not the caller.
    fn internal(err: anyhow::Error) -> Self {
        error!("request failed: {:#}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ============ Request/response bodies ============

#[derive(Deserialize)]
struct QueryRequest {
    /// Absent field is not rejected; an empty query goes to the model.
    #[serde(default)]
    query: Option<String>,
}

#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Serialize)]
struct IngestResponse {
    status: String,
    filename: String,
    doc_len: usize,
    chunk_count: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ============ Handlers ============

/// `POST /ai` — send the query text unmodified to the LLM. No retrieval,
/// no context.
async fn handle_raw_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let query = req.query.unwrap_or_default();
    info!(query_len = query.len(), "POST /ai");

    let answer = state.llm.generate(&query).await.map_err(AppError::internal)?;

    Ok(Json(AnswerResponse { answer }))
}

/// `POST /ask_pdf` — run the retrieval chain and return only the
/// generated answer. Retrieved-source metadata is intentionally withheld.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let query = req.query.unwrap_or_default();
    info!(query_len = query.len(), "POST /ask_pdf");

    let answer = chain::answer_question(
        &state.config,
        &state.llm,
        state.embedder.as_ref(),
        &query,
    )
    .await
    .map_err(AppError::internal)?;

    Ok(Json(AnswerResponse { answer }))
}

/// `POST /pdf` — multipart upload of a PDF or CSV file.
///
/// The file is staged under its original filename before any parsing
/// (last write for a filename wins), then dispatched by extension. The
/// staged file remains on disk even when the extension is rejected.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|f| f.to_string())
            .ok_or_else(|| AppError::bad_request("file field has no filename"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(format!("failed to read upload: {}", e)))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::bad_request("multipart field 'file' is required"))?;

    // Strip any path components a client might smuggle into the filename.
    let filename = std::path::Path::new(&filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::bad_request("invalid upload filename"))?;

    info!(filename = %filename, bytes = data.len(), "POST /pdf");

    let staging_dir = &state.config.storage.staging_dir;
    std::fs::create_dir_all(staging_dir)
        .map_err(|e| AppError::internal(anyhow::Error::from(e)))?;
    let staged_path = staging_dir.join(&filename);
    std::fs::write(&staged_path, &data)
        .map_err(|e| AppError::internal(anyhow::Error::from(e)))?;

    let kind = FileKind::from_filename(&filename)
        .ok_or_else(|| AppError::bad_request(UNSUPPORTED_FILE_TYPE))?;

    let summary = ingest::ingest_file(
        &state.config,
        state.embedder.as_ref(),
        &staged_path,
        &filename,
        kind,
    )
    .await
    .map_err(AppError::internal)?;

    info!(
        filename = %filename,
        doc_len = summary.doc_len,
        chunk_count = summary.chunk_count,
        "upload ingested"
    );

    Ok(Json(IngestResponse {
        status: "Successfully Uploaded".to_string(),
        filename,
        doc_len: summary.doc_len,
        chunk_count: summary.chunk_count,
    }))
}

/// `GET /health` — simple liveness check.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
