// src/core/protocol/mod.rs

pub mod line_codec;
pub mod reply;
pub use line_codec::{DEFAULT_MAX_LINE_LENGTH, InboundLine, LineCodec, PROMPT};
pub use reply::{HELP_TEXT, Reply, WELCOME_MESSAGE};
