//! Command Handler Module
//!
//! This module implements the command processing layer for FlashLink.
//! It receives parsed commands, executes them against the link registry,
//! and returns appropriate replies.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandParser   │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │  (this module)
//! │                 │
//! │  - Dispatch     │
//! │  - Validate     │
//! │  - Execute      │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Registry        │  (storage module)
//! └─────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - `SHORTEN`, `RESOLVE`, `ANALYTICS`, `UPDATE`, `DELETE`, `LIST`
//! - `PING`, `ECHO`, `DBSIZE`, `INFO`, `COMMAND`, `QUIT`

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
