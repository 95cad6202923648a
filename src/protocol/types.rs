//! RESP Reply Values
//!
//! The subset of RESP (Redis Serialization Protocol) FlashLink writes back to
//! clients. Every reply starts with a type prefix byte and ends with CRLF:
//!
//! - `+` Simple String: `+OK\r\n`
//! - `-` Error: `-NOTFOUND alias does not exist or has expired\r\n`
//! - `:` Integer: `:1\r\n`
//! - `$` Bulk String: `$19\r\nhttps://example.com\r\n`
//! - `*` Array: `*2\r\n$5\r\ntotal\r\n:0\r\n`
//! - Null: `$-1\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A reply sent to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Status line, cannot contain CRLF
    SimpleString(String),
    /// Error line; the first word is the error code (`ERR`, `NOTFOUND`, ...)
    Error(String),
    Integer(i64),
    /// Binary-safe string
    BulkString(Bytes),
    /// Null bulk string
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// Bulk string holding a copy of `s`.
    pub fn bulk_str(s: &str) -> Self {
        RespValue::BulkString(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn null() -> Self {
        RespValue::Null
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(values)
    }

    /// Flat field/value array, the way Redis replies to `HGETALL`.
    pub fn map<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, RespValue)>,
    {
        let mut values = Vec::new();
        for (field, value) in pairs {
            values.push(RespValue::bulk_str(field));
            values.push(value);
        }
        RespValue::Array(values)
    }

    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes the value to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::BulkString(data) => {
                write_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            RespValue::Array(values) => {
                write_line(buf, prefix::ARRAY, values.len().to_string().as_bytes());
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// The inner text of a simple or bulk string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Looks up `field` in a flat field/value array built by [`RespValue::map`].
    pub fn field(&self, field: &str) -> Option<&RespValue> {
        self.as_array()?
            .chunks_exact(2)
            .find(|pair| pair[0].as_str() == Some(field))
            .map(|pair| &pair[1])
    }
}

fn write_line(buf: &mut Vec<u8>, prefix: u8, content: &[u8]) {
    buf.push(prefix);
    buf.extend_from_slice(content);
    buf.extend_from_slice(CRLF);
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            RespValue::Null => write!(f, "(nil)"),
            RespValue::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            RespValue::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    writeln!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_serialize() {
        assert_eq!(RespValue::ok().serialize(), b"+OK\r\n");
        assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
        assert_eq!(
            RespValue::error("NOTFOUND gone").serialize(),
            b"-NOTFOUND gone\r\n"
        );
        assert_eq!(RespValue::integer(-42).serialize(), b":-42\r\n");
        assert_eq!(RespValue::null().serialize(), b"$-1\r\n");
        assert!(RespValue::null().is_null());
        assert!(!RespValue::bulk_str("").is_null());
    }

    #[test]
    fn test_bulk_string_serialize() {
        let value = RespValue::bulk_str("https://example.com");
        assert_eq!(value.serialize(), b"$19\r\nhttps://example.com\r\n");
    }

    #[test]
    fn test_map_serialize() {
        let value = RespValue::map([
            ("total", RespValue::integer(0)),
            ("urls", RespValue::array(vec![])),
        ]);
        assert_eq!(
            value.serialize(),
            b"*4\r\n$5\r\ntotal\r\n:0\r\n$4\r\nurls\r\n*0\r\n"
        );
    }

    #[test]
    fn test_field_lookup() {
        let value = RespValue::map([
            ("alias", RespValue::bulk_str("abc")),
            ("access_count", RespValue::integer(3)),
        ]);
        assert_eq!(value.field("alias").and_then(|v| v.as_str()), Some("abc"));
        assert_eq!(
            value.field("access_count").and_then(|v| v.as_integer()),
            Some(3)
        );
        assert!(value.field("missing").is_none());
        assert!(RespValue::null().field("alias").is_none());
    }
}
