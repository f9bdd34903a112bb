// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, TextEncoder, register_counter, register_counter_vec,
    register_gauge,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of clients currently connected to the server.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("memorydb_connected_clients", "Number of currently connected clients.").unwrap();
    /// The number of keys held by the store.
    pub static ref STORED_KEYS: Gauge =
        register_gauge!("memorydb_stored_keys", "Number of keys currently held by the store.").unwrap();

    // --- Server-wide Counters ---
    /// The total number of commands processed by the server since startup.
    pub static ref COMMANDS_PROCESSED_TOTAL: Counter =
        register_counter!("memorydb_commands_processed_total", "Total number of commands processed.").unwrap();
    /// The total number of lines that did not match any command.
    pub static ref UNKNOWN_COMMANDS_TOTAL: Counter =
        register_counter!("memorydb_unknown_commands_total", "Total number of unrecognized command lines.").unwrap();
    /// The total number of connections accepted by the server since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("memorydb_connections_received_total", "Total number of connections received.").unwrap();
    /// Connections closed by the shutdown sweep rather than by the client.
    pub static ref CONNECTIONS_FORCE_CLOSED_TOTAL: Counter =
        register_counter!("memorydb_connections_force_closed_total", "Total number of connections force-closed during shutdown.").unwrap();
    /// Snapshot writes, labeled by outcome.
    pub static ref SNAPSHOT_SAVES_TOTAL: CounterVec =
        register_counter_vec!("memorydb_snapshot_saves_total", "Total number of snapshot saves, labeled by result.", &["result"]).unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# failed to encode metrics: {e}\n"))
}
