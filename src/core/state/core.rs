// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use super::client::ConnectionRegistry;
use crate::config::Config;
use crate::core::MemoryDbError;
use crate::core::storage::Store;
use std::path::Path;
use std::time::{Duration, Instant};

/// The central struct holding all shared, server-wide state.
/// It is wrapped in an `Arc` and handed to the listener, every session handler
/// and the background tasks.
#[derive(Debug)]
pub struct ServerState {
    /// The configuration the server was started with.
    pub config: Config,
    /// The key-value data.
    pub store: Store,
    /// Every open client connection.
    pub registry: ConnectionRegistry,
    /// When the server finished initializing.
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(config: Config, store: Store) -> Self {
        Self {
            config,
            store,
            registry: ConnectionRegistry::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates the state, loading the store from the configured snapshot file.
    pub async fn initialize(config: Config) -> Self {
        let store = Store::load(&config.snapshot.path).await;
        Self::new(config, store)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.config.snapshot.path
    }

    /// Writes the store to the configured snapshot file.
    pub async fn save(&self) -> Result<usize, MemoryDbError> {
        self.store.save(self.snapshot_path()).await
    }
}
