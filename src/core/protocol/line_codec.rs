// src/core/protocol/line_codec.rs

//! Implements the line protocol as a `tokio_util::codec` `Encoder`/`Decoder` pair.
//!
//! Inbound, every newline-terminated line is one command (a trailing `\r` is
//! stripped, invalid UTF-8 is replaced). Outbound, every reply is followed by a
//! newline and the prompt marker.

use super::reply::Reply;
use crate::core::MemoryDbError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Written after every reply line.
pub const PROMPT: &str = "➤ ";

/// The default limit on the length of a single inbound line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// One decoded inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    Text(String),
    /// The line exceeded the length limit; its bytes are being discarded up to
    /// the next newline.
    Overlong,
}

/// A `tokio_util::codec` implementation for the newline-delimited protocol.
#[derive(Debug)]
pub struct LineCodec {
    max_length: usize,
    /// Where to resume the newline search on the next call.
    next_index: usize,
    /// True while skipping the rest of an overlong line.
    discarding: bool,
}

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

fn to_text(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

impl Decoder for LineCodec {
    type Item = InboundLine;
    type Error = MemoryDbError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            // Never look further than one byte past the limit.
            let read_to = src.len().min(self.max_length.saturating_add(1));
            let newline = src[self.next_index..read_to]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match (self.discarding, newline) {
                (true, Some(index)) => {
                    src.advance(index + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    src.advance(read_to);
                    self.next_index = 0;
                    if src.is_empty() {
                        return Ok(None);
                    }
                }
                (false, Some(index)) => {
                    self.next_index = 0;
                    let line = src.split_to(index + 1);
                    return Ok(Some(InboundLine::Text(to_text(&line[..index]))));
                }
                (false, None) if src.len() > self.max_length => {
                    self.discarding = true;
                    self.next_index = 0;
                    return Ok(Some(InboundLine::Overlong));
                }
                (false, None) => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if self.discarding || src.is_empty() {
            src.clear();
            self.discarding = false;
            self.next_index = 0;
            return Ok(None);
        }
        // A final line without a trailing newline still counts as a command.
        self.next_index = 0;
        let line = src.split_to(src.len());
        Ok(Some(InboundLine::Text(to_text(&line))))
    }
}

impl Encoder<Reply> for LineCodec {
    type Error = MemoryDbError;

    fn encode(&mut self, item: Reply, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let text = item.to_string();
        dst.reserve(text.len() + 1 + PROMPT.len());
        dst.put_slice(text.as_bytes());
        dst.put_u8(b'\n');
        dst.put_slice(PROMPT.as_bytes());
        Ok(())
    }
}
