// src/core/errors.rs

//! Defines the primary error type for the entire application.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
#[derive(Error, Debug)]
pub enum MemoryDbError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("Syntax error")]
    SyntaxError,

    /// A client sent a line longer than the configured limit.
    #[error("ERR line exceeds {0} bytes")]
    LineTooLong(usize),

    #[error("Snapshot Error: {0}")]
    Snapshot(String),

    #[error("Connection {0} is not registered")]
    NotRegistered(String),

    #[error("Connection {0} is already closed")]
    ConnectionClosed(String),
}

// `std::io::Error` is not cloneable, so it is shared behind an Arc.
impl Clone for MemoryDbError {
    fn clone(&self) -> Self {
        match self {
            MemoryDbError::Io(e) => MemoryDbError::Io(Arc::clone(e)),
            MemoryDbError::WrongArgumentCount(s) => MemoryDbError::WrongArgumentCount(s.clone()),
            MemoryDbError::SyntaxError => MemoryDbError::SyntaxError,
            MemoryDbError::LineTooLong(n) => MemoryDbError::LineTooLong(*n),
            MemoryDbError::Snapshot(s) => MemoryDbError::Snapshot(s.clone()),
            MemoryDbError::NotRegistered(s) => MemoryDbError::NotRegistered(s.clone()),
            MemoryDbError::ConnectionClosed(s) => MemoryDbError::ConnectionClosed(s.clone()),
        }
    }
}

impl PartialEq for MemoryDbError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MemoryDbError::Io(e1), MemoryDbError::Io(e2)) => e1.kind() == e2.kind(),
            (MemoryDbError::WrongArgumentCount(s1), MemoryDbError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (MemoryDbError::SyntaxError, MemoryDbError::SyntaxError) => true,
            (MemoryDbError::LineTooLong(a), MemoryDbError::LineTooLong(b)) => a == b,
            (MemoryDbError::Snapshot(s1), MemoryDbError::Snapshot(s2)) => s1 == s2,
            (MemoryDbError::NotRegistered(s1), MemoryDbError::NotRegistered(s2)) => s1 == s2,
            (MemoryDbError::ConnectionClosed(s1), MemoryDbError::ConnectionClosed(s2)) => {
                s1 == s2
            }
            _ => false,
        }
    }
}

impl MemoryDbError {
    /// True for errors that mean the peer went away rather than something breaking.
    pub fn is_normal_disconnect(&self) -> bool {
        matches!(self, MemoryDbError::Io(e) if matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof
                | std::io::ErrorKind::ConnectionAborted
        ))
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for MemoryDbError {
    fn from(e: std::io::Error) -> Self {
        MemoryDbError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for MemoryDbError {
    fn from(e: serde_json::Error) -> Self {
        MemoryDbError::Snapshot(format!("JSON serialization/deserialization error: {e}"))
    }
}

