// src/core/persistence/mod.rs

//! Snapshot persistence: loading the store at startup and writing it back at
//! shutdown (and, when configured, periodically).

pub mod snapshot;

pub use snapshot::{read_snapshot, write_snapshot};
