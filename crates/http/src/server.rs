use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::{any, get, post};
use axum::Router;
use rex_core::Clock;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;
use crate::routes;
use crate::state::AppState;

/// Builds the router: explicit routes for health/rules/history take
/// precedence over the webhook wildcard by construction (axum matches
/// static segments before wildcards regardless of registration order).
pub fn build_router<C: Clock>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(routes::health::<C>))
        .route("/api/rules", get(routes::list_rules::<C>))
        .route("/api/history", get(routes::history::<C>))
        .route("/api/fire/{name}", post(routes::fire::<C>))
        .route("/api/reload", post(routes::reload::<C>))
        .route("/{*path}", any(routes::webhook_catch_all::<C>))
        .with_state(state)
}

/// Binds the listen address, split out from `serve` so callers (and
/// tests) can observe the bound address before the accept loop starts —
/// useful when `port` is 0 and the kernel picks one.
pub async fn bind(host: &str, port: u16) -> Result<tokio::net::TcpListener, HttpError> {
    let addr: SocketAddr = format!("{host}:{port}").parse().map_err(|e: std::net::AddrParseError| {
        HttpError::Bind(format!("{host}:{port}"), std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))
    })?;

    tokio::net::TcpListener::bind(addr).await.map_err(|e| HttpError::Bind(format!("{host}:{port}"), e))
}

/// Serves the router on an already-bound listener until `cancel` fires,
/// then stops accepting new connections and drains in-flight ones for up
/// to 5 seconds.
pub async fn serve_on<C: Clock>(listener: tokio::net::TcpListener, state: AppState<C>, cancel: CancellationToken) -> Result<(), HttpError> {
    let local_addr = listener.local_addr().map(|a| a.to_string()).unwrap_or_default();
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            tracing::info!("http listener draining, grace period 5s");
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await
        .map_err(|e| HttpError::Bind(local_addr, e))
}

/// Binds and serves until `cancel` fires.
pub async fn serve<C: Clock>(host: &str, port: u16, state: AppState<C>, cancel: CancellationToken) -> Result<(), HttpError> {
    let listener = bind(host, port).await?;
    serve_on(listener, state, cancel).await
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
