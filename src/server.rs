//! Listener setup and the serve loop.

use std::future::Future;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::api::router::create_router;
use crate::api::state::SharedState;
use crate::config::AppConfig;

/// Bind the configured `host:port`.
pub async fn bind(config: &AppConfig) -> std::io::Result<TcpListener> {
    TcpListener::bind(config.bind_addr()).await
}

/// Serve HTTP and WebSocket traffic until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C. If the handler cannot be installed the server keeps
/// running until killed.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
