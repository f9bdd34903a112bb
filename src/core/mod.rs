// src/core/mod.rs

//! The central module containing the core logic and data structures of MemoryDB.

pub mod commands;
pub mod errors;
pub mod metrics;
pub mod persistence;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod tasks;

pub use commands::Command;
pub use errors::MemoryDbError;
pub use protocol::Reply;
