// src/connection/session.rs

//! Defines the lifecycle states of a single client session.

use std::fmt;

/// Where a session is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted; the welcome line has not been written yet.
    Greeting,
    /// Reading and answering commands.
    Serving,
    /// Finished. The stream is released once the handler returns.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Greeting => "greeting",
            SessionState::Serving => "serving",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
