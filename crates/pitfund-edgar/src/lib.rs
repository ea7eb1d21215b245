#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/pitfund/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR ingestion core.
//!
//! Pipeline order, matching the data flow through a snapshot build:
//!
//! 1. [`CikResolver`](cik::CikResolver) - tickers to CIKs
//! 2. [`FilingsIndex`](filings::FilingsIndex) - submission history, PIT-gated
//! 3. [`FilingSelector`](selector::FilingSelector) - one filing per period
//! 4. [`XbrlFetcher`](facts::XbrlFetcher) - companyfacts to fact lists
//! 5. [`contexts`] + [`mapper`] - best-fact selection per standard field
//! 6. [`StatementParser`](statements::StatementParser) - standardized rows
//!
//! All network traffic flows through [`EdgarClient`](client::EdgarClient),
//! which enforces the shared rate limit, the retry policy, and the
//! response cache.

/// Ticker to CIK resolution.
pub mod cik;
/// Rate-limited, cached HTTP client.
pub mod client;
/// XBRL context selection.
pub mod contexts;
/// Companyfacts fetcher and fact normalization.
pub mod facts;
/// Filings index with the point-in-time gate.
pub mod filings;
/// Token-bucket rate limiter.
pub mod limiter;
/// Tag priority map.
pub mod mapper;
/// Retry policy with exponential backoff.
pub mod retry;
/// Per-period filing selection.
pub mod selector;
/// Statement row builders.
pub mod statements;
/// EDGAR endpoint URLs.
pub mod urls;

pub use cik::{CikEntry, CikResolver};
pub use client::{EdgarClient, request_cache_key};
pub use contexts::{best_fact_for_period, filter_by_period_type, FUZZY_MATCH_DAYS};
pub use facts::{GAAP_NAMESPACES, XbrlFetcher};
pub use filings::{ANNUAL_FORMS, FilingsIndex, FormFilter, QUARTERLY_FORMS, normalize_accession};
pub use limiter::TokenBucket;
pub use mapper::{FIELD_TO_MAPPING, TAG_PRIORITY_MAP, TAG_TO_FIELD, fields_for, resolve_field};
pub use retry::{RETRYABLE_STATUS, RetryPolicy, is_retryable_status};
pub use selector::FilingSelector;
pub use statements::StatementParser;
