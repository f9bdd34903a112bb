// src/core/state/mod.rs

//! Defines the central `ServerState` struct and the connection registry.

mod client;
mod core;

pub use client::*;
pub use core::ServerState;
