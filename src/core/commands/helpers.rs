// src/core/commands/helpers.rs

//! Argument helpers shared by the command parsers.

use crate::core::MemoryDbError;

/// Validates that the number of arguments matches the expected count.
pub fn validate_arg_count(args: &[&str], expected: usize, cmd: &str) -> Result<(), MemoryDbError> {
    if args.len() != expected {
        Err(MemoryDbError::WrongArgumentCount(cmd.to_string()))
    } else {
        Ok(())
    }
}

/// Splits a command line into whitespace-separated tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}
