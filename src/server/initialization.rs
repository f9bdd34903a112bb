// src/server/initialization.rs

//! Handles server initialization: loading the store from its snapshot and
//! binding the listening socket.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
///
/// Only a bind failure is fatal; a missing or unreadable snapshot leaves the
/// store empty.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let server_state = Arc::new(ServerState::initialize(config).await);
    info!("Server state initialized.");

    let config = &server_state.config;
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read the listener's local address")?;
    info!("MemoryDB server listening on {}", local_addr);
    let connection_permits = Arc::new(Semaphore::new(config.max_clients));

    Ok(ServerContext {
        state: server_state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
        connection_permits,
    })
}

fn log_startup_info(config: &Config) {
    info!(
        "Snapshot file: '{}'. Shutdown grace period: {}.",
        config.snapshot.path.display(),
        humantime::format_duration(config.shutdown.grace_period)
    );
    match config.snapshot.autosave_interval {
        Some(interval) => info!(
            "Autosave every {}.",
            humantime::format_duration(interval)
        ),
        None => warn!("Autosave is disabled. Data is persisted only on shutdown."),
    }
}
