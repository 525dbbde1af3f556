use crate::config::ServerConfig;
use crate::signaling::{SignalingRelay, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub const HEALTH_MESSAGE: &str = "medlink relay running";

async fn health() -> &'static str {
    HEALTH_MESSAGE
}

pub fn router(relay: SignalingRelay) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ws", get(ws_handler))
        .with_state(relay)
}

/// Binds `config.listen` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    let relay = SignalingRelay::new(&config);

    serve_on(listener, relay, shutdown_signal()).await
}

pub async fn serve_on(
    listener: TcpListener,
    relay: SignalingRelay,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    info!(
        "Signaling relay listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            tracing::warn!("Ctrl-C handler unavailable, running until killed: {}", e);
            std::future::pending::<()>().await
        }
    }
}
