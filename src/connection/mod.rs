// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: greeting, command
//! execution, shutdown notices, and cleanup.

mod guard;
mod handler;
mod session;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
pub use session::SessionState;
