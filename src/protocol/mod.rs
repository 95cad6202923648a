//! RESP Protocol Implementation
//!
//! FlashLink speaks RESP (the Redis Serialization Protocol) so any Redis
//! client can drive it.
//!
//! ## Modules
//!
//! - `types`: the `RespValue` replies and their serialization
//! - `parser`: incremental parser for incoming commands
//!
//! ## Example
//!
//! ```
//! use flashlink::protocol::{parse_command, RespValue};
//!
//! let (args, consumed) = parse_command(b"RESOLVE abc123\r\n").unwrap().unwrap();
//! assert_eq!(args.len(), 2);
//! assert_eq!(consumed, 16);
//!
//! let reply = RespValue::bulk_str("https://example.com");
//! assert_eq!(reply.serialize(), b"$19\r\nhttps://example.com\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_command, CommandParser, Frame, ParseError, ParseResult};
pub use types::RespValue;
