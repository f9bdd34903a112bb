// src/core/commands/command_trait.rs

//! Defines the core traits for all executable commands.

use crate::core::MemoryDbError;
use crate::core::protocol::Reply;
use crate::core::storage::Store;

/// A trait for parsing a command's arguments (the tokens after the keyword).
pub trait ParseCommand: Sized {
    /// Parses the arguments and returns an instance of the command struct.
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError>;
}

/// A trait for the actual execution logic of a command.
/// Implemented by each command's struct (e.g., `Get`, `Set`).
pub trait ExecutableCommand {
    fn execute(&self, store: &Store) -> Reply;
}

/// What the session should do after a command ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Write this reply and keep serving.
    Reply(Reply),
    /// The client asked to end the session. Nothing is written.
    CloseSession,
}
