// src/core/commands/keys.rs

//! Implements `keys *`.
//!
//! Only the match-everything pattern is supported; any other pattern is a
//! syntax error and the line is answered as an unknown command.

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::Reply;
use crate::core::storage::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keys;

impl ParseCommand for Keys {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 1, "keys")?;
        if args[0] != "*" {
            return Err(MemoryDbError::SyntaxError);
        }
        Ok(Keys)
    }
}

impl ExecutableCommand for Keys {
    fn execute(&self, store: &Store) -> Reply {
        Reply::Keys(store.keys())
    }
}
