// src/core/protocol/reply.rs

//! The replies the server writes back to clients.

use std::fmt;

/// Sent once when a connection is accepted.
pub const WELCOME_MESSAGE: &str = "Welcome to MemoryDB server";

/// The usage listing returned by `help`.
pub const HELP_TEXT: &str = "
-----------------------------------------
set    <key> <value> ➜ set a key-value pair
get    <key>         ➜ get a value by key
delete <key>         ➜ delete a key-value pair
keys     *           ➜ get all keys
help                 ➜ show this list
exit                 ➜ close the connection
-----------------------------------------
";

/// A single reply line (the help text is the only multi-line reply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome,
    Ok,
    Value(String),
    NotFound(String),
    Keys(Vec<String>),
    Help,
    /// The offending input, echoed back.
    Unknown(String),
    /// An out-of-band message from the server, such as the shutdown warning.
    Notice(String),
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Welcome => f.write_str(WELCOME_MESSAGE),
            Reply::Ok => f.write_str("OK"),
            Reply::Value(v) => f.write_str(v),
            Reply::NotFound(key) => write!(f, "key {key} not found"),
            Reply::Keys(keys) => write!(f, "[{}]", keys.join(" ")),
            Reply::Help => f.write_str(HELP_TEXT),
            Reply::Unknown(input) => write!(f, "UNKNOWN: {input}"),
            Reply::Notice(msg) => f.write_str(msg),
            Reply::Error(msg) => f.write_str(msg),
        }
    }
}
