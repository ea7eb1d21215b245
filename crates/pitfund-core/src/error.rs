//! Error types for the snapshot engine.
//!
//! This module defines [`EngineError`] which covers every failure mode in
//! the pipeline, from HTTP transport up to schema validation. The most
//! important variant is [`EngineError::CutoffViolation`]: it signals that
//! data from after the point-in-time cutoff reached a component that must
//! never see it, and it is always fatal.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Errors that can occur while building a snapshot.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// A non-retryable HTTP status was returned.
    #[error("HTTP {status} for {url}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The URL that was requested.
        url: String,
    },

    /// SEC throttled the request and retries were exhausted.
    #[error("Rate limit exhausted after {attempts} attempts: {url}")]
    RateLimit {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// The URL that was requested.
        url: String,
    },

    /// A ticker could not be resolved to a CIK.
    #[error("CIK resolution failed for ticker '{0}'")]
    CikLookup(String),

    /// No filing survived the point-in-time gate for a ticker.
    #[error("No filing found for ticker '{ticker}' with cutoff {cutoff}")]
    FilingNotFound {
        /// The ticker that was looked up.
        ticker: String,
        /// The cutoff date in effect.
        cutoff: NaiveDate,
    },

    /// Data from after the cutoff reached a downstream component.
    ///
    /// This is the central safety error of the engine and is never
    /// recoverable: it means the point-in-time gate was breached.
    #[error(
        "Cutoff violation for ticker '{ticker}': accession {accession} \
         accepted at {acceptance} which is after cutoff {cutoff}"
    )]
    CutoffViolation {
        /// The ticker involved.
        ticker: String,
        /// The accession number of the offending filing.
        accession: String,
        /// The acceptance datetime that breached the gate.
        acceptance: NaiveDateTime,
        /// The cutoff date that was in effect.
        cutoff: NaiveDate,
    },

    /// The companyfacts response could not be parsed.
    #[error("XBRL parse error for CIK {cik}: {detail}")]
    XbrlParse {
        /// Zero-padded CIK of the company being parsed.
        cik: String,
        /// Diagnostic detail.
        detail: String,
    },

    /// A table does not comply with its registered schema.
    #[error("Schema validation failed for table '{table}': {violations:?}")]
    SchemaValidation {
        /// Name of the failing table.
        table: String,
        /// Human-readable violation descriptions.
        violations: Vec<String>,
    },

    /// Error interacting with the response cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Error parsing upstream data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
