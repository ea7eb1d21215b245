#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/pitfund/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Response cache backends for the pitfund engine.
//!
//! This crate provides implementations of the [`ResponseCache`] trait from
//! `pitfund-core`:
//!
//! - [`SqliteResponseCache`] - Persistent, size-capped, SQLite-backed (default)
//! - [`InMemoryResponseCache`] - Simple in-memory cache for testing
//! - [`NoopResponseCache`] - Disables caching entirely

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;
/// SQLite-based cache implementation.
pub mod sqlite;

// Re-export the trait for convenience
pub use pitfund_core::ResponseCache;

// Re-export implementations
pub use memory::InMemoryResponseCache;
pub use noop::NoopResponseCache;
pub use sqlite::SqliteResponseCache;
