// src/server/spawner.rs

//! Spawns the server's long-running background tasks.

use super::context::ServerContext;
use super::metrics_server;
use crate::core::tasks::SnapshotAutosaveTask;
use tracing::info;

/// Spawns the configured background tasks into the context's JoinSet.
pub fn spawn_all(ctx: &mut ServerContext) {
    let server_state = &ctx.state;
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Metrics Server ---
    if server_state.config.metrics.enabled {
        let metrics_state = server_state.clone();
        let shutdown_rx_metrics = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            metrics_server::run_metrics_server(metrics_state, shutdown_rx_metrics).await;
            Ok(())
        });
    } else {
        info!("Prometheus metrics server is disabled in the configuration.");
    }

    // --- Persistence ---
    if server_state.config.snapshot.autosave_interval.is_some() {
        let autosave_task = SnapshotAutosaveTask::new(server_state.clone());
        let shutdown_rx_autosave = shutdown_tx.subscribe();
        background_tasks.spawn(async move {
            autosave_task.run(shutdown_rx_autosave).await;
            Ok(())
        });
    }

    info!("Spawned {} background task(s).", background_tasks.len());
}
