//! Shared API types and the service-level handlers.

use crate::audio_store::AudioStoreError;
use crate::orchestrator::OrchestratorError;
use axum::{
    extract::Json,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use dialtone_voice::VoiceResponse;
use serde_json::{json, Value};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// A call-setup step failed. Reported with `200 OK` and the failing
    /// stage so callers can tell a refused request from a broken server.
    #[error(transparent)]
    Flow(#[from] OrchestratorError),
}

impl From<AudioStoreError> for ApiError {
    fn from(err: AudioStoreError) -> Self {
        match err {
            AudioStoreError::NotFound(_) => ApiError::NotFound("file not found".to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Flow(err) => {
                tracing::warn!(stage = %err.stage(), "call setup failed: {}", err);
                (
                    StatusCode::OK,
                    json!({ "error": err.to_string(), "stage": err.stage() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// A voice document served to the telephony provider as `application/xml`.
#[derive(Debug, Clone)]
pub struct VoiceDocument(pub VoiceResponse);

impl IntoResponse for VoiceDocument {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/xml")],
            self.0.to_xml(),
        )
            .into_response()
    }
}

/// Handler for `GET /`.
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": "Dialtone call agent is running." }))
}

/// Handler for `GET /health`.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
