mod api;
mod chat;
mod config;
mod engine;
mod error;
mod geo;
mod models;
mod observability;
mod state;
mod store;

use std::sync::Arc;

use chrono::Duration;
use tracing_subscriber::EnvFilter;

use crate::chat::HttpChatApi;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let chat = HttpChatApi::new(config.chat_api_base.clone())
        .map_err(|err| error::AppError::Internal(format!("chat client init failed: {err}")))?;

    let (app_state, broadcast_rx) = state::AppState::new(
        Arc::new(chat),
        config.broadcast_queue_size,
        Duration::seconds(config.pending_action_ttl_secs),
    );
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(engine::broadcast::run_broadcast_engine(
        shared_state.clone(),
        broadcast_rx,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
