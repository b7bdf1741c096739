//! Customer-leg handlers: `/make-call`, `/outgoing-call`, `/gather-handler`,
//! and the `/call-status` callback shared by both legs.

use crate::api::{ApiError, VoiceDocument};
use crate::AppState;
use axum::extract::{Extension, Form, Json, Query};
use axum::http::StatusCode;
use dialtone_types::{CallLeg, DigitResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for `POST /make-call`.
#[derive(Debug, Default, Deserialize)]
pub struct MakeCallParams {
    pub to_phone_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallInitiated {
    pub status: String,
    pub call_sid: String,
}

/// Fields the telephony provider posts with every voice callback.
///
/// Only the ones this service reads are declared; the rest are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct VoiceCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
}

impl VoiceCallback {
    pub fn digit_response(&self) -> DigitResponse {
        DigitResponse::from_callback(
            self.digits.as_deref(),
            self.from.as_deref(),
            self.call_sid.as_deref(),
        )
    }
}

/// Call lifecycle fields posted to the status callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct CallStatusCallback {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,
}

/// Handler for `POST /make-call`.
pub async fn make_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<MakeCallParams>,
) -> Result<Json<CallInitiated>, ApiError> {
    let call_sid = state
        .orchestrator
        .start_customer_call(params.to_phone_number.as_deref())
        .await?;

    Ok(Json(CallInitiated {
        status: "call_initiated".to_string(),
        call_sid,
    }))
}

/// Handler for `GET|POST /outgoing-call`.
///
/// `Form` reads the query string on `GET` and the body on `POST`.
pub async fn outgoing_call_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(callback): Form<VoiceCallback>,
) -> VoiceDocument {
    tracing::debug!(call_sid = ?callback.call_sid, "serving customer prompt");
    VoiceDocument(
        state
            .orchestrator
            .customer_prompt(callback.call_sid.as_deref()),
    )
}

/// Handler for `POST /gather-handler`.
pub async fn gather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(callback): Form<VoiceCallback>,
) -> VoiceDocument {
    let reply = state
        .orchestrator
        .handle_digit(CallLeg::Customer, callback.digit_response(), None)
        .await;
    VoiceDocument(reply)
}

/// Handler for `POST /call-status`.
///
/// Closes sessions whose call ended before a digit callback arrived.
pub async fn call_status_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(callback): Form<CallStatusCallback>,
) -> StatusCode {
    if let (Some(call_sid), Some(status)) = (
        callback.call_sid.as_deref(),
        callback.call_status.as_deref(),
    ) {
        state.orchestrator.call_ended(call_sid, status);
    }
    StatusCode::NO_CONTENT
}
