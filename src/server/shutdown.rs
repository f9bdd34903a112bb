// src/server/shutdown.rs

//! The draining half of the listener: warning connected clients, waiting out
//! the grace period, and force-closing whoever is left.

use crate::core::metrics;
use crate::core::state::ServerState;
use std::fmt;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time;
use tracing::{info, warn};

/// The listener's lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Accepting connections.
    Running,
    /// The listening socket is closed; existing sessions are being wound down.
    Draining,
    /// Sessions are gone and the store has been saved.
    Stopped,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerState::Running => "running",
            ListenerState::Draining => "draining",
            ListenerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a completed shutdown did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Connections the shutdown warning was delivered to.
    pub warned: usize,
    /// Connections still open after the grace period that were asked to close.
    pub force_closed: usize,
    /// Session tasks that ignored the close request and were aborted.
    pub aborted: usize,
    /// Whether the final snapshot save succeeded.
    pub saved: bool,
}

/// The line broadcast to every connected client when shutdown begins.
pub fn shutdown_warning(grace_period: Duration) -> String {
    format!(
        "host wants to shut down the server in: {}",
        humantime::format_duration(grace_period)
    )
}

/// Waits until every task in `tasks` has finished, or until `limit` elapses.
/// Returns false on timeout.
async fn join_all_within(tasks: &mut JoinSet<()>, limit: Duration) -> bool {
    time::timeout(limit, async { while tasks.join_next().await.is_some() {} })
        .await
        .is_ok()
}

/// Winds down every open session. The listening socket must already be closed.
pub(super) async fn drain_sessions(
    state: &ServerState,
    client_tasks: &mut JoinSet<()>,
    report: &mut ShutdownReport,
) {
    let shutdown = &state.config.shutdown;

    if !state.registry.is_empty() {
        let notice = shutdown_warning(shutdown.grace_period);
        report.warned = state.registry.broadcast(&notice);
        info!(
            "Warned {} connected client(s). Waiting up to {} for them to disconnect.",
            report.warned,
            humantime::format_duration(shutdown.grace_period)
        );

        // Ends early once every session has finished on its own.
        join_all_within(client_tasks, shutdown.grace_period).await;

        let close = state.registry.close_all();
        report.force_closed = close.closed.len();
        if close.attempted() > 0 {
            metrics::CONNECTIONS_FORCE_CLOSED_TOTAL.inc_by(close.closed.len() as f64);
            info!(
                "Force-closing {} connection(s) after the grace period ({} could not be reached).",
                close.closed.len(),
                close.failed.len()
            );
        }
    }

    if !join_all_within(client_tasks, shutdown.close_timeout).await {
        report.aborted = client_tasks.len();
        warn!(
            "{} session(s) did not exit within {}; aborting them.",
            report.aborted,
            humantime::format_duration(shutdown.close_timeout)
        );
        client_tasks.shutdown().await;
    }
    info!("All client connections closed.");
}
