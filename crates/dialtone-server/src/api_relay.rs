//! Counterpart-leg handlers: `/simulate-customer`, `/outgoing-to-barber`,
//! `/barber-response`.

use crate::api::{ApiError, VoiceDocument};
use crate::api_calls::VoiceCallback;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Form, Json, Query},
};
use chrono::Local;
use dialtone_types::{AppointmentRequest, CallLeg, Language};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /simulate-customer`. The body itself is optional.
#[derive(Debug, Default, Deserialize)]
pub struct SimulateRequest {
    /// Free text to extract the appointment time from.
    pub text: Option<String>,
    /// Language code (`de`), locale (`de-DE`) or English name.
    pub target_language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub status: String,
    pub call_sid: String,
    pub audio_url: String,
    pub appointment: AppointmentRequest,
    /// What the counterpart hears, digit instructions included.
    pub translated_text: String,
    pub language: Language,
}

/// Query parameters carried on the counterpart-leg callback URLs.
#[derive(Debug, Default, Deserialize)]
pub struct RelayPromptParams {
    /// Stored audio id. A missing or unknown id yields the goodbye-only
    /// document.
    pub audio: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelayResponseParams {
    pub lang: Option<String>,
}

/// Parses a language hint from a callback URL. A bad hint on a live call
/// is logged and ignored rather than failing the provider's request.
fn language_hint(raw: Option<&str>) -> Option<Language> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<Language>() {
        Ok(language) => Some(language),
        Err(e) => {
            tracing::warn!(lang = raw, "ignoring language hint: {}", e);
            None
        }
    }
}

/// Handler for `POST /simulate-customer`.
pub async fn simulate_customer_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SimulateResponse>, ApiError> {
    let request: SimulateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SimulateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?
    };

    let target = request
        .target_language
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::parse::<Language>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| state.config.calls.default_request_text.clone());

    let relay = state
        .orchestrator
        .simulate_customer(&text, target, Local::now().naive_local())
        .await?;

    Ok(Json(SimulateResponse {
        status: "call_initiated".to_string(),
        call_sid: relay.call_sid,
        audio_url: relay.audio_url,
        appointment: relay.appointment,
        translated_text: relay.prompt.spoken,
        language: relay.prompt.language,
    }))
}

/// Handler for `GET|POST /outgoing-to-barber`.
pub async fn outgoing_to_barber_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RelayPromptParams>,
    Form(callback): Form<VoiceCallback>,
) -> VoiceDocument {
    let orchestrator = &state.orchestrator;
    let language = language_hint(params.lang.as_deref())
        .unwrap_or(orchestrator.settings().target_language);

    VoiceDocument(orchestrator.counterpart_prompt(
        params.audio.as_deref().map(str::trim).filter(|id| !id.is_empty()),
        language,
        callback.call_sid.as_deref(),
    ))
}

/// Handler for `POST /barber-response`.
pub async fn barber_response_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RelayResponseParams>,
    Form(callback): Form<VoiceCallback>,
) -> VoiceDocument {
    let reply = state
        .orchestrator
        .handle_digit(
            CallLeg::Counterpart,
            callback.digit_response(),
            language_hint(params.lang.as_deref()),
        )
        .await;
    VoiceDocument(reply)
}
