// src/core/commands/mod.rs

//! This module defines all supported commands and the central `Command` enum
//! that encapsulates their parsed state.
//!
//! Parsing never fails: a line that does not match any command shape becomes
//! `Command::Unknown`, which replies by echoing the input back.

use crate::core::protocol::Reply;
use crate::core::storage::Store;
use tracing::debug;

pub mod command_trait;
pub mod delete;
pub mod exit;
pub mod get;
pub mod help;
pub mod helpers;
pub mod keys;
pub mod set;

pub use command_trait::{ExecutableCommand, Outcome, ParseCommand};
pub use delete::Delete;
pub use exit::Exit;
pub use get::Get;
pub use help::Help;
pub use keys::Keys;
pub use set::Set;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Set),
    Get(Get),
    Delete(Delete),
    Keys(Keys),
    Help(Help),
    Exit(Exit),
    /// Anything else, holding the trimmed input line.
    Unknown(String),
}

impl Command {
    /// Parses one command line. The keyword is matched case-insensitively.
    pub fn parse(line: &str) -> Command {
        let input = line.trim();
        let tokens = helpers::tokenize(input);
        let Some((keyword, args)) = tokens.split_first() else {
            return Command::Unknown(input.to_string());
        };

        let parsed = match keyword.to_lowercase().as_str() {
            "set" => Set::parse(args).map(Command::Set),
            "get" => Get::parse(args).map(Command::Get),
            "delete" => Delete::parse(args).map(Command::Delete),
            "keys" => Keys::parse(args).map(Command::Keys),
            "help" => Help::parse(args).map(Command::Help),
            "exit" => Exit::parse(args).map(Command::Exit),
            _ => return Command::Unknown(input.to_string()),
        };

        parsed.unwrap_or_else(|e| {
            debug!("Rejected command line '{}': {}", input, e);
            Command::Unknown(input.to_string())
        })
    }

    /// The lowercase command name, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set(_) => "set",
            Command::Get(_) => "get",
            Command::Delete(_) => "delete",
            Command::Keys(_) => "keys",
            Command::Help(_) => "help",
            Command::Exit(_) => "exit",
            Command::Unknown(_) => "unknown",
        }
    }

    /// Runs the command against the store.
    pub fn execute(&self, store: &Store) -> Outcome {
        let reply = match self {
            Command::Set(cmd) => cmd.execute(store),
            Command::Get(cmd) => cmd.execute(store),
            Command::Delete(cmd) => cmd.execute(store),
            Command::Keys(cmd) => cmd.execute(store),
            Command::Help(cmd) => cmd.execute(store),
            Command::Exit(_) => return Outcome::CloseSession,
            Command::Unknown(input) => Reply::Unknown(input.clone()),
        };
        Outcome::Reply(reply)
    }
}
