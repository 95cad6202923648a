//! Incremental Command Parser
//!
//! Clients send commands either as RESP arrays of bulk strings (what every
//! Redis client library and `redis-cli` does) or as a plain inline line
//! (what you type into `nc`):
//!
//! ```text
//! *2\r\n$7\r\nRESOLVE\r\n$6\r\naB3xYz\r\n
//! RESOLVE aB3xYz\r\n
//! ```
//!
//! The parser works on a borrowed buffer and returns:
//! - `Ok(Some((args, consumed)))` - a complete command, `consumed` bytes used
//! - `Ok(None)` - the command is incomplete, read more data
//! - `Err(ParseError)` - the client sent something that is not a command

use crate::protocol::types::{prefix, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while parsing a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid length header
    #[error("invalid length: {0}")]
    InvalidLength(String),

    /// Invalid UTF-8 in an inline command
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Array element that is not a bulk string
    #[error("expected bulk string, got {0:#04x}")]
    UnexpectedPrefix(u8),

    /// Protocol violation (missing CRLF, empty command, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The command exceeds the allowed size
    #[error("command too large: {size} (max: {max})")]
    TooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size of a single argument (1 MB); targets are URLs, not blobs
pub const MAX_ARG_SIZE: usize = 1024 * 1024;

/// Maximum number of arguments in one command
pub const MAX_ARGS: usize = 64;

/// A complete command: its arguments and the number of bytes it used.
pub type Frame = (Vec<Bytes>, usize);

/// Stateless parser for client commands.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Attempts to parse one command from the front of `buf`.
    pub fn parse(&self, buf: &[u8]) -> ParseResult<Option<Frame>> {
        match buf.first() {
            None => Ok(None),
            Some(&prefix::ARRAY) => parse_array(buf),
            Some(_) => parse_inline(buf),
        }
    }
}

/// Parses `*<n>\r\n` followed by `n` bulk strings.
fn parse_array(buf: &[u8]) -> ParseResult<Option<Frame>> {
    let Some((count, mut pos)) = read_length(buf, 1)? else {
        return Ok(None);
    };

    if count < 1 {
        return Err(ParseError::ProtocolError("empty command".to_string()));
    }
    let count = count as usize;
    if count > MAX_ARGS {
        return Err(ParseError::TooLarge {
            size: count,
            max: MAX_ARGS,
        });
    }

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        match buf.get(pos) {
            None => return Ok(None),
            Some(&prefix::BULK_STRING) => {}
            Some(&other) => return Err(ParseError::UnexpectedPrefix(other)),
        }

        let Some((len, data_start)) = read_length(buf, pos + 1)? else {
            return Ok(None);
        };
        if len < 0 {
            return Err(ParseError::InvalidLength(len.to_string()));
        }
        let len = len as usize;
        if len > MAX_ARG_SIZE {
            return Err(ParseError::TooLarge {
                size: len,
                max: MAX_ARG_SIZE,
            });
        }

        let data_end = data_start + len;
        if buf.len() < data_end + CRLF.len() {
            return Ok(None);
        }
        if &buf[data_end..data_end + CRLF.len()] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        args.push(Bytes::copy_from_slice(&buf[data_start..data_end]));
        pos = data_end + CRLF.len();
    }

    Ok(Some((args, pos)))
}

/// Parses a whitespace separated line.
fn parse_inline(buf: &[u8]) -> ParseResult<Option<Frame>> {
    let Some(end) = find_crlf(buf) else {
        if buf.len() > MAX_ARG_SIZE {
            return Err(ParseError::TooLarge {
                size: buf.len(),
                max: MAX_ARG_SIZE,
            });
        }
        return Ok(None);
    };

    let line = std::str::from_utf8(&buf[..end])
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

    let args: Vec<Bytes> = line
        .split_whitespace()
        .map(|part| Bytes::copy_from_slice(part.as_bytes()))
        .collect();
    if args.is_empty() {
        return Err(ParseError::ProtocolError("empty inline command".to_string()));
    }

    Ok(Some((args, end + CRLF.len())))
}

/// Reads a decimal length line starting at `start`.
///
/// Returns the value and the offset just past its CRLF.
fn read_length(buf: &[u8], start: usize) -> ParseResult<Option<(i64, usize)>> {
    let Some(rest) = buf.get(start..) else {
        return Ok(None);
    };
    let Some(end) = find_crlf(rest) else {
        return Ok(None);
    };

    let text = std::str::from_utf8(&rest[..end])
        .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
    let value = text
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidLength(text.to_string()))?;

    Ok(Some((value, start + end + CRLF.len())))
}

/// Position of the first CRLF in `buf`.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Helper function to parse a single command from bytes.
pub fn parse_command(buf: &[u8]) -> ParseResult<Option<Frame>> {
    CommandParser::new().parse(buf)
}
