// src/server/mod.rs

//! The TCP server: startup, the accept loop, and the shutdown sequence.

use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod shutdown;
mod spawner;

pub use connection_loop::AcceptBackoff;
pub use shutdown::{ListenerState, ShutdownReport, shutdown_warning};

/// Requests shutdown of a running server. Cloneable, so it can be handed to a
/// signal handler while the server itself is being awaited.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    stop_tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Initiates shutdown. Calling it again has no further effect.
    pub fn shutdown(&self) {
        if !self.stop_tx.send_replace(true) {
            info!("Graceful shutdown initiated.");
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

/// A running server.
///
/// Dropping it without calling [`Server::stop`] or [`Server::wait`] also
/// initiates shutdown, as long as no [`ShutdownHandle`] is still alive.
pub struct Server {
    state: Arc<ServerState>,
    local_addr: SocketAddr,
    stop: ShutdownHandle,
    listener_state: watch::Receiver<ListenerState>,
    listener_task: JoinHandle<ShutdownReport>,
}

impl Server {
    /// Loads the store, binds the listener, spawns background tasks and the
    /// accept loop, and returns the running server.
    ///
    /// The configuration is used as given; `Config::from_file` and `main`
    /// validate it before it gets here.
    pub async fn start(config: Config) -> Result<Server> {
        let mut ctx = initialization::setup(config).await?;
        spawner::spawn_all(&mut ctx);

        let local_addr = ctx.listener.local_addr()?;
        let state = ctx.state.clone();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ListenerState::Running);
        let listener_task = tokio::spawn(connection_loop::run(ctx, stop_rx, state_tx));

        Ok(Server {
            state,
            local_addr,
            stop: ShutdownHandle {
                stop_tx: Arc::new(stop_tx),
            },
            listener_state: state_rx,
            listener_task,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    pub fn listener_state(&self) -> ListenerState {
        *self.listener_state.borrow()
    }

    /// A receiver that follows the listener through `Draining` to `Stopped`,
    /// usable after the server itself has been handed to `stop` or `wait`.
    pub fn listener_state_watch(&self) -> watch::Receiver<ListenerState> {
        self.listener_state.clone()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.stop.clone()
    }

    /// Initiates shutdown and waits for it to complete.
    pub async fn stop(self) -> ShutdownReport {
        self.stop.shutdown();
        self.wait().await
    }

    /// Waits for the server to shut down without initiating it.
    pub async fn wait(self) -> ShutdownReport {
        match self.listener_task.await {
            Ok(report) => report,
            Err(e) => {
                error!("CRITICAL: The listener task failed: {e:?}");
                ShutdownReport::default()
            }
        }
    }
}
