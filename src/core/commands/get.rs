// src/core/commands/get.rs

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::Reply;
use crate::core::storage::{Store, normalize_key, render_value};

/// `get <key>`: looks a key up. A missing key is a normal reply, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Get {
    pub key: String,
}

impl ParseCommand for Get {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 1, "get")?;
        Ok(Get {
            key: args[0].to_string(),
        })
    }
}

impl ExecutableCommand for Get {
    fn execute(&self, store: &Store) -> Reply {
        match store.get(&self.key) {
            Some(value) => Reply::Value(render_value(&value)),
            None => Reply::NotFound(normalize_key(&self.key)),
        }
    }
}
