// src/core/commands/help.rs

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::Reply;
use crate::core::storage::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help;

impl ParseCommand for Help {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 0, "help")?;
        Ok(Help)
    }
}

impl ExecutableCommand for Help {
    fn execute(&self, _store: &Store) -> Reply {
        Reply::Help
    }
}
