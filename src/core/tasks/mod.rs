// src/core/tasks/mod.rs

//! Long-running background tasks that support the server's core functionality.

pub mod autosave;

pub use autosave::SnapshotAutosaveTask;
