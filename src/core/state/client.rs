// src/core/state/client.rs

//! The connection registry: every open client connection, keyed by identity.
//!
//! The registry never touches a connection's stream. Each entry holds the
//! sending half of a control channel owned by the session handler, through
//! which the shutdown path can deliver a notice or request a close. Sends on an
//! unbounded channel never block, so no registry operation can stall.

use crate::core::MemoryDbError;
use dashmap::DashMap;
use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A unique identity, generated fresh for every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A message delivered to a session handler from outside its own loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    /// Write this line to the client.
    Notice(String),
    /// End the session and drop the stream.
    Close,
}

pub type ControlReceiver = mpsc::UnboundedReceiver<ControlSignal>;

/// The registry's view of one connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    addr: SocketAddr,
    connected_at: Instant,
    control: mpsc::UnboundedSender<ControlSignal>,
}

impl ConnectionHandle {
    /// Creates a handle and the receiving half the session handler listens on.
    pub fn new(addr: SocketAddr) -> (Self, ControlReceiver) {
        let (control, rx) = mpsc::unbounded_channel();
        let handle = Self {
            addr,
            connected_at: Instant::now(),
            control,
        };
        (handle, rx)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// True once the session handler has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.control.is_closed()
    }

    /// Asks the session to write `message` to its client.
    pub fn notify(&self, message: impl Into<String>) -> Result<(), MemoryDbError> {
        self.send(ControlSignal::Notice(message.into()))
    }

    /// Asks the session to close its connection.
    pub fn close(&self) -> Result<(), MemoryDbError> {
        self.send(ControlSignal::Close)
    }

    fn send(&self, signal: ControlSignal) -> Result<(), MemoryDbError> {
        self.control
            .send(signal)
            .map_err(|_| MemoryDbError::ConnectionClosed(self.addr.to_string()))
    }
}

/// The outcome of a `close_all` sweep.
#[derive(Debug, Default)]
pub struct CloseReport {
    /// Connections that accepted the close request.
    pub closed: Vec<ConnectionId>,
    /// Connections whose close request could not be delivered.
    pub failed: Vec<(ConnectionId, MemoryDbError)>,
}

impl CloseReport {
    pub fn attempted(&self) -> usize {
        self.closed.len() + self.failed.len()
    }
}

/// Tracks open connections by identity. Backed by a sharded `DashMap`, so
/// handlers registering and deregistering concurrently with the shutdown sweep
/// only ever contend on a single shard.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection. Identities are unique, so a replaced entry indicates a
    /// bug and is logged.
    pub fn register(&self, id: ConnectionId, handle: ConnectionHandle) {
        if let Some(previous) = self.connections.insert(id, handle) {
            warn!(
                "Connection id {} was already registered (previous peer {}).",
                id,
                previous.addr()
            );
        }
    }

    /// Removes a connection. Idempotent: returns `false` if it was already gone.
    pub fn deregister(&self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Result<ConnectionHandle, MemoryDbError> {
        self.connections
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MemoryDbError::NotRegistered(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    /// Copies the current entries out so callers never hold shard locks while
    /// acting on them.
    fn snapshot(&self) -> Vec<(ConnectionId, ConnectionHandle)> {
        self.connections
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Calls `f` for every connection registered at call time.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ConnectionId, &ConnectionHandle),
    {
        for (id, handle) in self.snapshot() {
            f(&id, &handle);
        }
    }

    /// Sends `message` to every registered connection. Returns how many
    /// sessions it was delivered to.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        self.for_each(|id, handle| match handle.notify(message) {
            Ok(()) => delivered += 1,
            Err(e) => debug!("Could not notify connection {}: {}", id, e),
        });
        delivered
    }

    /// Requests every registered connection to close. A failed request does
    /// not stop the sweep; failures are collected and logged.
    pub fn close_all(&self) -> CloseReport {
        let mut report = CloseReport::default();
        self.for_each(|id, handle| match handle.close() {
            Ok(()) => report.closed.push(*id),
            Err(e) => {
                warn!(
                    "Could not close connection {} ({}): {}",
                    id,
                    handle.addr(),
                    e
                );
                report.failed.push((*id, e));
            }
        });
        report
    }
}
