//! Builds the app state over the in-memory backend, binds the configured
//! address, and serves the router until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use slurmrest_api::{AppState, Service};
use slurmrest_backend::{BackendCaps, CtldBackend, DbdBackend, MockBackend};

use crate::config::Config;

/// Run the server until it receives a shutdown signal, or return an
/// error if the listener can't be bound.
pub async fn run(config: Config) -> Result<()> {
    let backend = Arc::new(MockBackend::new());
    let ctld: Arc<dyn CtldBackend> = backend.clone();
    let dbd: Arc<dyn DbdBackend> = backend;
    let caps = BackendCaps {
        tres_update_enabled: config.tres_update_enabled,
    };
    let state = AppState::new(ctld, dbd, caps);

    let app = Service::new(state).into_router().layer(DefaultBodyLimit::max(config.max_body_bytes));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!(
        bind = %config.bind,
        backend = %config.backend,
        data_parser_version = %config.data_parser_version,
        "slurmrest-server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install Ctrl+C handler; shutdown signal unavailable");
        return;
    }
    tracing::info!("shutdown signal received, starting graceful shutdown");
}
