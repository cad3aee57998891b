//! docchat - chat with your documents
//!
//! Serves per-session transcripts of questions about uploaded documents,
//! backed by an external upload/ask/history service.

mod api;
mod backend;
mod config;
mod controller;
mod formatter;
mod render;
mod session;
mod transcript;

use api::{create_router, AppState};
use backend::{HttpBackend, LoggingBackend};
use config::Config;
use controller::ControllerOptions;
use session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        ask_timeout = ?config.ask_timeout,
        markup = ?config.markup,
        session_idle = ?config.session_idle,
        "Configuration loaded"
    );

    // Document service client
    let backend = Arc::new(LoggingBackend::new(HttpBackend::new(&config.backend_url)));
    let options = ControllerOptions {
        ask_timeout: config.ask_timeout,
    };

    // Create application state
    let sessions = Arc::new(SessionManager::new(backend, options));
    if let Some(max_idle) = config.session_idle {
        sessions.start_idle_sweeper(max_idle);
    }
    let state = AppState::new(sessions, config.markup);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("docchat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
