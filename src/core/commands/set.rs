// src/core/commands/set.rs

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::Reply;
use crate::core::storage::Store;

/// `set <key> <value>`: stores a value, overwriting any previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set {
    pub key: String,
    pub value: String,
}

impl ParseCommand for Set {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 2, "set")?;
        Ok(Set {
            key: args[0].to_string(),
            value: args[1].to_string(),
        })
    }
}

impl ExecutableCommand for Set {
    fn execute(&self, store: &Store) -> Reply {
        store.set(&self.key, self.value.clone());
        Reply::Ok
    }
}
