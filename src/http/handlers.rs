use super::state::AppState;
use crate::error::IngestError;
use crate::ingest::{artifact_file_name, IngestOutcome};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Acknowledgement returned for every request
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    /// "success" or "error"
    pub status: String,

    pub message: String,

    /// Sequence number of the file this request completed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,

    /// File name of the artifact this request completed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            sequence: None,
            file: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            sequence: None,
            file: None,
        }
    }

    fn with_artifact(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self.file = Some(artifact_file_name(sequence));
        self
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Ack::error(format!("Failed to process audio data: {}", self))),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api
/// Accept one raw PCM chunk
pub async fn ingest_audio(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected audio chunk: {}", rejection.body_text());
            return (rejection.status(), Json(Ack::error(rejection.body_text()))).into_response();
        }
    };

    debug!("Received audio chunk: {} bytes", body.len());

    match state.ingest.ingest(body).await {
        Ok(IngestOutcome::Accepted { pending }) => (
            StatusCode::OK,
            Json(Ack::success(format!(
                "Data received ({} chunks pending)",
                pending
            ))),
        )
            .into_response(),
        Ok(IngestOutcome::Persisted { sequence, path }) => {
            info!("Batch {} saved to {}", sequence, path.display());
            (
                StatusCode::OK,
                Json(
                    Ack::success("Data received and saved as WAV file").with_artifact(sequence),
                ),
            )
                .into_response()
        }
        Ok(IngestOutcome::Queued { sequence }) => (
            StatusCode::OK,
            Json(Ack::success("Data received, WAV file queued for writing").with_artifact(sequence)),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to process audio data: {}", e);
            e.into_response()
        }
    }
}

/// GET /api/status
/// Accumulation state and counters
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.ingest.status().await))
}

/// Any method a route does not serve, or any unknown route
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Ack::error("Only POST method is supported")),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
