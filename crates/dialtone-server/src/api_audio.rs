//! `GET /audio/{filename}`: serves synthesized prompt audio to the
//! telephony provider.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Strips the optional `.mp3` extension from a requested filename.
fn artifact_id(filename: &str) -> &str {
    filename.strip_suffix(".mp3").unwrap_or(filename)
}

/// Handler for `GET /audio/{filename}`.
pub async fn get_audio_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state.orchestrator.audio().get(artifact_id(&filename))?;
    tracing::debug!(audio_id = %artifact.id, bytes = artifact.bytes.len(), "serving audio");

    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type),
            (header::CACHE_CONTROL, "no-store"),
        ],
        artifact.bytes.to_vec(),
    )
        .into_response())
}
