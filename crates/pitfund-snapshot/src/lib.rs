#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/pitfund/pitfund/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Snapshot assembly and orchestration.
//!
//! - [`SnapshotEngine`](builder::SnapshotEngine) - Top-level pipeline
//! - [`assemble`] - Typed rows to schema-shaped DataFrames
//! - [`derived`] - Derived metrics on the joined rows
//! - [`validate`] - Schema and accounting-identity validation
//! - [`coverage`] - Coverage report generation

/// Typed rows to schema-shaped DataFrames.
pub mod assemble;
/// Top-level snapshot orchestration.
pub mod builder;
/// Coverage report generation.
pub mod coverage;
/// Derived metrics.
pub mod derived;
/// Schema and accounting-identity validation.
pub mod validate;

pub use assemble::{
    CompanyRow, balance_frame, cashflow_frame, company_master_frame, filings_frame, income_frame,
};
pub use builder::SnapshotEngine;
pub use coverage::build_coverage_report;
pub use derived::{derived_frame, derived_rows};
pub use validate::{
    BALANCE_SHEET_TOLERANCE, CASHFLOW_ABSOLUTE_FLOOR, CASHFLOW_RELATIVE_TOLERANCE,
    assert_valid_table, check_balance_identity, check_cashflow_reconciliation, validate_table,
};
