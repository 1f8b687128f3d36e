//! Router construction and server entry point.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig, error::ServerError, infrastructure::auth::JwtTokenVerifier,
};

use super::{
    handler::{
        get_playback_state, get_sessions, health_check, post_playback_command, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router over `state`
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/playback/state", get(get_playback_state))
        .route("/api/playback/command", post(post_playback_command))
        .route("/api/sessions", get(get_sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until Ctrl-C / SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    if config.is_dev_jwt_secret() {
        tracing::warn!("Using the development JWT secret; set CADENCE_JWT_SECRET in production");
    }

    let verifier = JwtTokenVerifier::new(&config.jwt_secret)?;
    let state = Arc::new(AppState::new(Arc::new(verifier)));
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
