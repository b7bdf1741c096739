//! Dialtone server binary: the call agent's HTTP entry point.
//!
//! Starts an axum HTTP server with structured logging, provider clients
//! built from configuration, and graceful shutdown on SIGTERM/SIGINT.

use dialtone_server::config;
use dialtone_server::orchestrator::{CallSettings, Orchestrator};
use dialtone_server::{app, AppState};
use dialtone_voice::{http_client, AzureSpeech, AzureTranslator, TwilioClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("DIALTONE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    // A missing .env is normal in production.
    let dotenv = dotenvy::dotenv();

    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("dialtone.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        dotenv = dotenv.is_ok(),
        "resolved startup configuration path"
    );

    if let Err(e) = config.validate() {
        tracing::error!("invalid configuration: {}", e);
        std::process::exit(1);
    }

    let http = http_client(&config.http).expect("failed to build HTTP client");
    let telephony = Arc::new(TwilioClient::new(http.clone(), config.twilio.clone()));
    let translator = Arc::new(AzureTranslator::new(http.clone(), &config.azure));
    let synthesizer = Arc::new(AzureSpeech::new(http, &config.azure));

    if config.calls.default_destination.is_none() {
        tracing::warn!("TOURIST_NUMBER not set: /make-call requires an explicit number");
    }
    if config.calls.counterpart_number.is_none() {
        tracing::warn!("BARBER_NUMBER not set: /simulate-customer will refuse to dial");
    }

    let orchestrator = Orchestrator::new(
        telephony,
        translator,
        synthesizer,
        CallSettings::from_config(&config),
    );

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
    };
    let app = app(state);

    tracing::info!(%addr, "starting dialtone server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address: is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("dialtone server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
