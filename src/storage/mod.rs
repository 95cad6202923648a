//! Storage Module
//!
//! This module provides the core of FlashLink: the link registry, its two
//! secondary indexes and the background expiry sweeper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Registry                             │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │  records    │  │ ReverseIndex │  │ ExpiryIndex  │        │
//! │  │ alias→Record│  │ target→alias │  │ deadline ord │        │
//! │  └─────────────┘  └──────────────┘  └──────────────┘        │
//! │                 one RwLock over all three                   │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │     ExpirySweeper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Bidirectional**: alias → target and target → aliases stay in lockstep
//! - **Ordered Expiry**: deadlines kept in a `BTreeMap`, O(log n) everywhere
//! - **Lazy Expiry**: expired links are removed on access
//! - **Active Expiry**: the sweeper drains due links from the index head
//! - **Access Analytics**: per-link hit counter and recent access window
//!
//! ## Example
//!
//! ```
//! use flashlink::storage::Registry;
//! use flashlink::RegistryConfig;
//!
//! let registry = Registry::new(RegistryConfig::default());
//!
//! let alias = registry.create("https://example.com", Some("ex"), Some(60)).unwrap();
//! assert_eq!(alias, "ex");
//!
//! registry.update("ex", Some("example"), None).unwrap();
//! assert_eq!(registry.aliases_for("https://example.com"), vec!["example".to_string()]);
//! ```

pub mod alias;
pub mod expiry;
pub mod expiry_index;
pub mod record;
pub mod registry;
pub mod reverse_index;

// Re-export commonly used types
pub use expiry::{start_expiry_sweeper, ExpirySweeper};
pub use expiry_index::{ExpiryEntry, ExpiryIndex};
pub use record::{AccessRecorder, LinkSnapshot, LinkStats, Record};
pub use registry::{Registry, RegistryError, RegistryResult, RegistryStats};
pub use reverse_index::ReverseIndex;
