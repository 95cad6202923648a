//! # FlashLink - An In-Memory Link Shortener with TTL Expiry
//!
//! FlashLink maps short aliases to target strings (usually URLs). Every link
//! carries a time-to-live and disappears once it runs out. A reverse index
//! answers "which aliases point at this target?", and per-link analytics
//! track how often and when a link was followed.
//!
//! ## Features
//!
//! - **Ordered Expiry**: deadlines live in an ordered index; the sweeper only
//!   ever touches links that are actually due
//! - **Lazy + Active Expiry**: expired links vanish on access and in the background
//! - **Bidirectional Index**: alias → target and target → aliases stay consistent
//! - **Redis-Compatible Surface**: speaks RESP, so `redis-cli` works as a client
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              FlashLink                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐   │
//! │  │  Command    │    │                 Registry                     │   │
//! │  │  Parser     │    │   records  │  reverse index  │  expiry index │   │
//! │  └─────────────┘    └──────────────────────────────────────────────┘   │
//! │                                               ▲                         │
//! │                     ┌─────────────────────────┴───────────────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashlink::{CommandHandler, ConnectionStats, Registry, RegistryConfig, handle_connection};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create the registry; its expiry sweeper starts with it
//!     let registry = Registry::start(RegistryConfig::default());
//!
//!     let stats = Arc::new(ConnectionStats::new());
//!     let listener = TcpListener::bind("127.0.0.1:6380").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let handler = CommandHandler::new(Arc::clone(&registry), "http://localhost:6380");
//!         tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: the registry, its indexes and the expiry sweeper
//! - [`config`]: registry tunables
//! - [`protocol`]: RESP replies and the command parser
//! - [`commands`]: the FlashLink command set
//! - [`connection`]: client connection management

pub mod commands;
pub mod config;
pub mod connection;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use config::RegistryConfig;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{CommandParser, ParseError, RespValue};
pub use storage::{
    start_expiry_sweeper, ExpirySweeper, LinkSnapshot, LinkStats, Registry, RegistryError,
    RegistryResult,
};

/// The default port FlashLink listens on
pub const DEFAULT_PORT: u16 = 6380;

/// The default host FlashLink binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of FlashLink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
