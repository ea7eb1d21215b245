#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/pitfund/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Unified entry point for the pitfund engine.
//!
//! Re-exports the core types and the snapshot pipeline. The usual flow:
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use pitfund::{EngineConfig, SnapshotEngine, SnapshotRequest, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> pitfund::Result<()> {
//!     let config = EngineConfig::new("ResearchProject/1.0 researcher@example.com")?;
//!     let engine = SnapshotEngine::new(config)?;
//!
//!     let request = SnapshotRequest::new(
//!         vec![Ticker::new("AAPL"), Ticker::new("MSFT")],
//!         NaiveDate::from_ymd_opt(2016, 12, 31).expect("valid date"),
//!     );
//!
//!     let result = engine.build(&request).await?;
//!     for (name, table) in result.tables.iter() {
//!         println!("{name}: {} rows", table.height());
//!     }
//!     println!(
//!         "coverage: {}/{} tickers",
//!         result.coverage.found_tickers.len(),
//!         result.coverage.total_tickers
//!     );
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use pitfund_core::*;

// Cache implementations
pub use pitfund_cache::{InMemoryResponseCache, NoopResponseCache, SqliteResponseCache};

// EDGAR ingestion core
pub use pitfund_edgar::{
    CikEntry, CikResolver, EdgarClient, FilingSelector, FilingsIndex, FormFilter, RetryPolicy,
    StatementParser, TokenBucket, XbrlFetcher,
};

// Snapshot pipeline
pub use pitfund_snapshot::SnapshotEngine;
