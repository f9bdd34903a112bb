// src/core/commands/delete.rs

use crate::core::MemoryDbError;
use crate::core::commands::command_trait::{ExecutableCommand, ParseCommand};
use crate::core::commands::helpers::validate_arg_count;
use crate::core::protocol::Reply;
use crate::core::storage::Store;
use tracing::debug;

/// `delete <key>`: removes a key. Deleting a missing key still replies `OK`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delete {
    pub key: String,
}

impl ParseCommand for Delete {
    fn parse(args: &[&str]) -> Result<Self, MemoryDbError> {
        validate_arg_count(args, 1, "delete")?;
        Ok(Delete {
            key: args[0].to_string(),
        })
    }
}

impl ExecutableCommand for Delete {
    fn execute(&self, store: &Store) -> Reply {
        if !store.delete(&self.key) {
            debug!("delete of absent key '{}' is a no-op", self.key);
        }
        Reply::Ok
    }
}
