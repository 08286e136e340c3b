//! HTTP surface for the relay service.
//!
//! Thin adapters over the orchestrators: handlers translate between HTTP and
//! the crate's error kinds and hold no pipeline logic of their own.

mod ws;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Settings;
use crate::error::ReferentError;
use crate::job::JobStatus;
use crate::orchestrator::{BatchOrchestrator, JobSnapshot};

/// Fallback when the client does not say what it is sending.
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Whole recordings arrive in one request; axum's 2 MiB default is too small.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Shared application state.
pub(crate) struct AppState {
    batch: BatchOrchestrator,
    settings: Settings,
}

/// Build the service router around a ready orchestrator.
pub fn router(batch: BatchOrchestrator, settings: Settings) -> Router {
    let state = Arc::new(AppState { batch, settings });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/status", get(status))
        .route("/stream", get(ws::stream))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct UploadResponse {
    transcript_id: String,
}

#[derive(Deserialize)]
struct StatusParams {
    transcript_id: String,
}

#[derive(Serialize)]
struct StatusResponse {
    transcript_id: String,
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorDetail>,
}

#[derive(Serialize)]
pub(crate) struct ErrorDetail {
    pub(crate) kind: &'static str,
    pub(crate) message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

fn error_response(e: &ReferentError) -> Response {
    let status = match e {
        ReferentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ReferentError::Upload(_)
        | ReferentError::ProviderRejected(_)
        | ReferentError::Submit(_)
        | ReferentError::StatusQuery(_)
        | ReferentError::ProviderFailed(_) => StatusCode::BAD_GATEWAY,
        ReferentError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: ErrorDetail {
                kind: e.kind(),
                message: e.to_string(),
            },
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    match state.batch.start_job(body.to_vec(), content_type).await {
        Ok(transcript_id) => {
            (StatusCode::ACCEPTED, Json(UploadResponse { transcript_id })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatusParams>,
) -> impl IntoResponse {
    match state.batch.check_status(&params.transcript_id).await {
        Ok(snapshot) => Json(status_response(params.transcript_id, snapshot)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// A provider-reported failure is a normal job outcome, so it stays a 200
/// with the error folded into the body.
fn status_response(transcript_id: String, snapshot: JobSnapshot) -> StatusResponse {
    match snapshot {
        JobSnapshot::Pending { status } => StatusResponse {
            transcript_id,
            status,
            transcript: None,
            summary: None,
            error: None,
        },
        JobSnapshot::Completed {
            transcript,
            summary,
            summary_error,
        } => StatusResponse {
            transcript_id,
            status: JobStatus::Completed,
            transcript: Some(transcript),
            summary,
            error: summary_error.map(|message| ErrorDetail {
                kind: "summarization_error",
                message,
            }),
        },
        JobSnapshot::Failed { reason } => StatusResponse {
            transcript_id,
            status: JobStatus::Failed,
            transcript: None,
            summary: None,
            error: Some(ErrorDetail {
                kind: "provider_failed",
                message: reason,
            }),
        },
    }
}
