// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::metrics;
use crate::core::state::{ConnectionHandle, ConnectionId, ServerState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Keeps a connection registered for as long as it lives.
///
/// The guard is created when the connection is registered, before its session
/// task is spawned, and moves into that task. However the task ends (normal
/// return, panic, or abort during shutdown) dropping the guard removes the
/// registry entry.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    id: ConnectionId,
    addr: SocketAddr,
    connected_at: Instant,
}

impl ConnectionGuard {
    /// Registers the connection and returns the guard that will deregister it.
    pub fn register(state: Arc<ServerState>, id: ConnectionId, handle: ConnectionHandle) -> Self {
        let addr = handle.addr();
        let connected_at = handle.connected_at();
        state.registry.register(id, handle);
        metrics::CONNECTED_CLIENTS.inc();
        Self {
            state,
            id,
            addr,
            connected_at,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        metrics::CONNECTED_CLIENTS.dec();
        if self.state.registry.deregister(&self.id) {
            debug!(
                "Connection {} ({}) deregistered after {:?}.",
                self.id,
                self.addr,
                self.connected_at.elapsed()
            );
        } else {
            debug!(
                "Connection {} ({}) was already gone from the registry upon cleanup.",
                self.id, self.addr
            );
        }
    }
}
