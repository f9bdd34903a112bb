// src/core/tasks/autosave.rs

//! Implements the optional snapshot auto-saver background task.
//! When `snapshot.autosave_interval` is set, the task writes the store to the
//! snapshot file on that interval, but only if it changed since the last save.
//! The final save at shutdown is performed by the listener, not by this task.

use crate::core::state::ServerState;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// The background task struct for the snapshot auto-saver.
pub struct SnapshotAutosaveTask {
    state: Arc<ServerState>,
}

impl SnapshotAutosaveTask {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    /// The main run loop. Returns immediately if auto-saving is not configured.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let Some(period) = self.state.config.snapshot.autosave_interval else {
            info!("No autosave interval configured. Snapshot auto-saver will not run.");
            return;
        };

        info!(
            "Snapshot auto-saver started (every {}).",
            humantime::format_duration(period)
        );
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing has changed yet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => self.save_if_dirty().await,
                _ = shutdown_rx.recv() => {
                    info!("Snapshot auto-saver task received shutdown signal.");
                    return;
                }
            }
        }
    }

    async fn save_if_dirty(&self) {
        let dirty = self.state.store.dirty_count();
        if dirty == 0 {
            debug!("Autosave tick: no changes since last save.");
            return;
        }
        match self.state.save().await {
            Ok(keys) => debug!("Autosaved {} keys ({} changes).", keys, dirty),
            Err(e) => error!("Background snapshot save failed: {}", e),
        }
    }
}
