// src/core/commands/exit.rs

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::validate_arg_count;

/// `exit`: ends the session from the client side.
///
/// There is no `ExecutableCommand` impl; the session handler closes the
/// connection when it sees this command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exit;

impl ParseCommand for Exit {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 0, "exit")?;
        Ok(Exit)
    }
}
