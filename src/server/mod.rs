//! Web server for the rendered dashboard.
//!
//! The page is rendered once before serving; every request gets the same
//! immutable bytes. The only route is `GET /`.

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Shared, read-only state handed to the handler.
#[derive(Clone)]
struct AppState {
    page: Bytes,
}

/// Build the router serving `page` at `/`.
pub fn router(page: Bytes) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .with_state(AppState { page })
}

async fn dashboard(State(state): State<AppState>) -> Html<Bytes> {
    debug!("Serving dashboard ({} bytes)", state.page.len());
    Html(state.page.clone())
}

/// Bind a listener, logging a clear message when the port is taken.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    info!("Attempting to bind server to http://{}", addr);
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", addr);
            Ok(listener)
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                error!("Address {} is already in use", addr);
            } else {
                error!("Failed to bind to {}: {}", addr, e);
            }
            Err(e).with_context(|| format!("Failed to bind to {}", addr))
        }
    }
}

/// Serve the page until Ctrl-C.
pub async fn serve(listener: TcpListener, page: Bytes) -> Result<()> {
    axum::serve(listener, router(page))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
