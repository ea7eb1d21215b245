#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/pitfund/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and rules for the point-in-time fundamental data engine.
//!
//! This crate provides the foundational pieces shared by every other
//! `pitfund` crate:
//!
//! - [`EngineError`](error::EngineError) - The error taxonomy
//! - [`EngineConfig`](config::EngineConfig) / [`ResolvedConfig`](config::ResolvedConfig) - Configuration with request precedence
//! - [`FilingRecord`](types::FilingRecord), [`XbrlFact`](types::XbrlFact) - EDGAR domain types
//! - [`dates`] - The point-in-time cutoff gate and period heuristics
//! - [`schema`] - Canonical output table schemas
//! - [`ResponseCache`](cache::ResponseCache) - HTTP payload cache trait

/// Cache trait for HTTP response payloads.
pub mod cache;
/// Engine configuration and precedence resolution.
pub mod config;
/// Point-in-time date utilities.
pub mod dates;
/// Error types for the snapshot engine.
pub mod error;
/// Typed statement rows.
pub mod rows;
/// Canonical output table schemas.
pub mod schema;
/// Core domain types.
pub mod types;

// Re-export commonly used items at crate root
pub use cache::ResponseCache;
pub use config::{EngineConfig, ResolvedConfig, SEC_MAX_RPS};
pub use error::{EngineError, Result};
pub use rows::{BalanceRow, CashflowRow, DerivedRow, IncomeRow, RowMeta};
pub use schema::{ColumnSpec, TableSchema};
pub use types::{
    ContextType, CoverageReport, DataSource, FactTable, FilingRecord, PeriodType, SnapshotRequest,
    SnapshotResult, SnapshotTables, StatementCoverage, TagMapping, Ticker, XbrlFact,
};
