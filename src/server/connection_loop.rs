// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and handling graceful shutdown.

use super::context::ServerContext;
use super::shutdown::{self, ListenerState, ShutdownReport};
use crate::connection::{ConnectionGuard, ConnectionHandler};
use crate::core::metrics;
use crate::core::state::{ConnectionHandle, ConnectionId, ServerState};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::JoinSet;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

/// How long background tasks get to stop before the final save goes ahead.
const BACKGROUND_TASK_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// The pause before retrying `accept` after consecutive failures, such as
/// running out of file descriptors. Doubles per failure up to [`Self::MAX`].
#[derive(Debug, Clone, Default)]
pub struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    pub const INITIAL: Duration = Duration::from_millis(10);
    pub const MAX: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed accept and returns how long to wait before the next.
    pub fn on_failure(&mut self) -> Duration {
        let delay = Self::INITIAL
            .saturating_mul(1u32 << self.failures.min(16))
            .min(Self::MAX);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Clears the failure streak after a successful accept.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Runs the listener until shutdown is requested, then drains sessions, stops
/// background tasks and saves the store.
///
/// Shutdown is requested by setting `stop_rx` to `true` or dropping its
/// sender. A failing background task also ends the loop.
pub(super) async fn run(
    ctx: ServerContext,
    mut stop_rx: watch::Receiver<bool>,
    listener_state: watch::Sender<ListenerState>,
) -> ShutdownReport {
    let ServerContext {
        state,
        listener,
        shutdown_tx,
        mut background_tasks,
        connection_permits,
    } = ctx;
    let mut client_tasks: JoinSet<()> = JoinSet::new();
    let accept_poll = state.config.shutdown.accept_poll_interval;
    let mut backoff = AcceptBackoff::new();

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => {
                info!("Shutdown requested. Closing the listener.");
                break;
            }

            Some(res) = background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A client handler panicked: {e:?}");
                }
            },

            res = time::timeout(accept_poll, next_connection(&listener, &connection_permits)) => {
                match res {
                    Ok(Ok((socket, addr, permit))) => {
                        backoff.reset();
                        spawn_session(&state, &mut client_tasks, socket, addr, permit);
                    }
                    Ok(Err(e)) => {
                        let delay = backoff.on_failure();
                        error!("Failed to accept connection: {}. Retrying in {:?}.", e, delay);
                        time::sleep(delay).await;
                    }
                    Err(_) => trace!("No connection within {:?}.", accept_poll),
                }
            },
        }
    }

    listener_state.send_replace(ListenerState::Draining);
    drop(listener);
    let mut report = ShutdownReport::default();
    shutdown::drain_sessions(&state, &mut client_tasks, &mut report).await;

    info!("Stopping background tasks.");
    if shutdown_tx.send(()).is_err() {
        debug!("No background tasks were listening for the shutdown signal.");
    }
    if time::timeout(BACKGROUND_TASK_STOP_TIMEOUT, async {
        while background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
        background_tasks.shutdown().await;
    }

    info!("Performing final snapshot save on shutdown...");
    report.saved = match state.save().await {
        Ok(keys) => {
            info!("Final snapshot save completed successfully ({} keys).", keys);
            true
        }
        Err(e) => {
            error!("CRITICAL: Final snapshot save on shutdown failed: {}", e);
            false
        }
    };

    listener_state.send_replace(ListenerState::Stopped);
    info!(
        "Server shutdown complete after {} of uptime.",
        humantime::format_duration(Duration::from_secs(state.uptime().as_secs()))
    );
    report
}

/// Waits for a free client slot, then for an inbound connection.
async fn next_connection(
    listener: &TcpListener,
    permits: &Arc<Semaphore>,
) -> io::Result<(TcpStream, SocketAddr, OwnedSemaphorePermit)> {
    let permit = permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| io::Error::other("connection limiter was closed"))?;
    let (socket, addr) = listener.accept().await?;
    Ok((socket, addr, permit))
}

/// Registers a fresh connection and spawns its session task. Registration
/// happens before the spawn, so the shutdown sweep can always see it.
fn spawn_session(
    state: &Arc<ServerState>,
    client_tasks: &mut JoinSet<()>,
    socket: TcpStream,
    addr: SocketAddr,
    permit: OwnedSemaphorePermit,
) {
    info!("Accepted new connection from: {}", addr);
    metrics::CONNECTIONS_RECEIVED_TOTAL.inc();

    let id = ConnectionId::new();
    let (handle, control_rx) = ConnectionHandle::new(addr);
    let guard = ConnectionGuard::register(state.clone(), id, handle);
    let handler = ConnectionHandler::new(socket, state.clone(), guard, control_rx);

    client_tasks.spawn(async move {
        let _permit = permit;
        if let Err(e) = handler.run().await {
            if e.is_normal_disconnect() {
                debug!("Connection {} from {} ended: {}", id, addr, e);
            } else {
                warn!("Connection from {} terminated unexpectedly: {}", addr, e);
            }
        }
    });
}
