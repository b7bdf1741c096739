//! Dialtone server library logic.

pub mod api;
pub mod api_audio;
pub mod api_calls;
pub mod api_relay;
pub mod audio_store;
pub mod compose;
pub mod config;
pub mod extract;
pub mod orchestrator;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use crate::config::Config;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
pub struct AppState {
    /// Immutable configuration, loaded once at startup.
    pub config: Arc<Config>,
    /// Call orchestration, sessions and audio.
    pub orchestrator: Arc<Orchestrator>,
}

/// Maximum request body size (64 KiB). Every route takes small forms or JSON.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root_handler))
        .route("/health", get(api::health_handler))
        .route("/make-call", post(api_calls::make_call_handler))
        .route(
            "/outgoing-call",
            get(api_calls::outgoing_call_handler).post(api_calls::outgoing_call_handler),
        )
        .route("/gather-handler", post(api_calls::gather_handler))
        .route("/call-status", post(api_calls::call_status_handler))
        .route(
            "/simulate-customer",
            post(api_relay::simulate_customer_handler),
        )
        .route("/audio/{filename}", get(api_audio::get_audio_handler))
        .route(
            "/outgoing-to-barber",
            get(api_relay::outgoing_to_barber_handler)
                .post(api_relay::outgoing_to_barber_handler),
        )
        .route(
            "/barber-response",
            post(api_relay::barber_response_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
