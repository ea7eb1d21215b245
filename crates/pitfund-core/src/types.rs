//! Core domain types for point-in-time fundamental data.
//!
//! This module defines the entities flowing through the engine:
//!
//! - [`Ticker`] - Equity ticker symbol
//! - [`FilingRecord`] - One SEC submission with its acceptance datetime
//! - [`XbrlFact`] - One reported number with contextual metadata
//! - [`TagMapping`] - One row of the static tag priority table
//! - [`SnapshotRequest`] / [`SnapshotResult`] - Pipeline input and output
//! - [`CoverageReport`] - What was found and what is missing

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An equity ticker symbol.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

/// Whether an XBRL fact spans a duration or is a point-in-time instant.
///
/// Income and cashflow items carry duration contexts; balance sheet items
/// carry instant contexts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextType {
    /// The fact covers a `[start, end]` interval.
    Duration,
    /// The fact is a point-in-time value (no start date).
    Instant,
}

/// Origin of the financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// SEC EDGAR filings.
    #[default]
    Edgar,
    /// Bloomberg XLSX export (external ingestion path).
    BloombergXlsx,
    /// Bloomberg PDF export (external ingestion path).
    BloombergPdf,
}

impl DataSource {
    /// The value stored in the `source` column of output tables.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edgar => "edgar",
            Self::BloombergXlsx => "bloomberg_xlsx",
            Self::BloombergPdf => "bloomberg_pdf",
        }
    }
}

/// Minimal metadata for a single SEC filing.
///
/// Every record that leaves the filings index satisfies
/// `acceptance_datetime <= end of cutoff day`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// SEC CIK as a zero-padded 10-digit string.
    pub cik: String,
    /// Accession number in dashed canonical form, e.g. `0001234567-23-000001`.
    pub accession: String,
    /// Form type string, e.g. `10-K` or `10-K/A`.
    pub form_type: String,
    /// Date the filing appeared on EDGAR.
    pub filing_date: NaiveDate,
    /// Naive datetime when the SEC accepted the filing.
    pub acceptance_datetime: NaiveDateTime,
    /// Fiscal period end date.
    pub period_of_report: NaiveDate,
    /// Equity ticker the record was resolved for.
    pub ticker: Ticker,
}

impl FilingRecord {
    /// Whether this filing is an amendment (`/A` form variant).
    #[must_use]
    pub fn is_amendment(&self) -> bool {
        self.form_type.ends_with("/A")
    }
}

/// A single XBRL fact extracted from the SEC companyfacts endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XbrlFact {
    /// GAAP/DEI concept name, e.g. `Revenues`.
    pub tag: String,
    /// XBRL namespace, e.g. `us-gaap`.
    pub namespace: String,
    /// Numeric value of the fact.
    pub value: f64,
    /// Unit string (`USD`, `shares`, ...).
    pub unit: String,
    /// Period start date for duration contexts; `None` for instants.
    pub start: Option<NaiveDate>,
    /// Period end date (or the instant date).
    pub end: NaiveDate,
    /// Accession number of the filing this fact belongs to.
    pub accession: String,
    /// Form type string linked to this fact.
    pub form: String,
    /// Calendar-aligned frame label (e.g. `CY2022`), when present.
    ///
    /// Companies with non-calendar fiscal years have no frame on their
    /// annual totals, so the frame is only ever a tie-breaker.
    pub frame: Option<String>,
    /// Date the fact was filed.
    pub filed: NaiveDate,
}

/// All facts for one company, keyed by `{namespace}:{tag}`.
pub type FactTable = HashMap<String, Vec<XbrlFact>>;

/// Maps a standardized field to one or more XBRL tag candidates.
///
/// Rows of the static tag priority table. Tags are tried in order; the
/// first one that yields a usable fact wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagMapping {
    /// Target column name in the standardized schema.
    pub standard_field: &'static str,
    /// Fully-qualified XBRL tags in priority order, e.g. `us-gaap:Revenues`.
    pub tags: &'static [&'static str],
    /// Multiply the raw value by -1 (for reported-negative items like
    /// capex and dividends paid).
    pub sign_flip: bool,
    /// Duration for income/cashflow items, instant for balance sheet.
    pub context_type: ContextType,
}

/// Describes what data to pull and the knowledge horizon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// Equity tickers to include.
    pub tickers: Vec<Ticker>,
    /// Strict cutoff: only filings accepted on or before the end of this
    /// day are included.
    pub cutoff_date: NaiveDate,
    /// Annual or quarterly filings.
    pub period_type: PeriodType,
    /// Prefer amended filings (10-K/A) over originals.
    pub include_amendments: bool,
    /// Whether LTM columns are allowed (stays `false` for PIT research;
    /// only consulted by external ingestion paths).
    pub allow_ltm: bool,
    /// Whether estimate columns are allowed. Must remain `false`: estimates
    /// carry forward-looking data and break PIT semantics.
    pub allow_estimates: bool,
}

impl SnapshotRequest {
    /// Creates a request with PIT-safe defaults (annual periods,
    /// amendments preferred, no LTM, no estimates).
    #[must_use]
    pub fn new(tickers: Vec<Ticker>, cutoff_date: NaiveDate) -> Self {
        Self {
            tickers,
            cutoff_date,
            period_type: PeriodType::Annual,
            include_amendments: true,
            allow_ltm: false,
            allow_estimates: false,
        }
    }

    /// Sets the period type.
    #[must_use]
    pub const fn with_period_type(mut self, period_type: PeriodType) -> Self {
        self.period_type = period_type;
        self
    }

    /// Sets the amendment preference.
    #[must_use]
    pub const fn with_amendments(mut self, include: bool) -> Self {
        self.include_amendments = include;
        self
    }
}

/// Coverage detail for one statement table (or one ticker within it).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementCoverage {
    /// Number of rows produced.
    pub rows: usize,
    /// Fraction of data cells that are populated, in `[0, 1]`.
    pub fill_ratio: f64,
    /// Data columns with no populated value at all.
    pub missing_fields: Vec<String>,
}

/// Documents what data is present or missing after a snapshot build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Number of tickers requested.
    pub total_tickers: usize,
    /// Tickers for which at least one statement row was produced.
    pub found_tickers: Vec<Ticker>,
    /// Tickers with no rows in any statement table.
    pub missing_tickers: Vec<Ticker>,
    /// Selected filings per ticker.
    pub filing_counts: HashMap<Ticker, usize>,
    /// Fill detail per statement table.
    pub statement_coverage: HashMap<String, StatementCoverage>,
    /// Fill detail per found ticker, per statement table.
    pub ticker_coverage: HashMap<Ticker, HashMap<String, StatementCoverage>>,
    /// Fraction of all data cells that are populated, in `[0, 1]`.
    pub overall_fill_ratio: f64,
}

impl CoverageReport {
    /// Fraction of requested tickers with at least one row.
    #[must_use]
    pub fn coverage_ratio(&self) -> f64 {
        if self.total_tickers == 0 {
            return 0.0;
        }
        self.found_tickers.len() as f64 / self.total_tickers as f64
    }
}

/// The six standardized output tables of a snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotTables {
    /// One row per resolved ticker: identity and registry metadata.
    pub company_master: DataFrame,
    /// One row per selected filing.
    pub filings: DataFrame,
    /// Standardized income statement rows.
    pub statements_income: DataFrame,
    /// Standardized balance sheet rows.
    pub statements_balance: DataFrame,
    /// Standardized cash flow rows.
    pub statements_cashflow: DataFrame,
    /// Derived metrics joined on `(cik, period_end)`.
    pub derived_metrics: DataFrame,
}

impl SnapshotTables {
    /// Iterate tables as `(canonical name, frame)` pairs, in output order.
    ///
    /// External writers serialize these unchanged.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &DataFrame)> {
        [
            ("company_master", &self.company_master),
            ("filings", &self.filings),
            ("statements_income", &self.statements_income),
            ("statements_balance", &self.statements_balance),
            ("statements_cashflow", &self.statements_cashflow),
            ("derived_metrics", &self.derived_metrics),
        ]
        .into_iter()
    }
}

/// Output of a snapshot build operation.
#[derive(Clone, Debug)]
pub struct SnapshotResult {
    /// The cutoff date used when building this snapshot.
    pub cutoff: NaiveDate,
    /// The standardized tables.
    pub tables: SnapshotTables,
    /// Summary of coverage and missing data.
    pub coverage: CoverageReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_uppercases() {
        assert_eq!(Ticker::new("aapl").as_str(), "AAPL");
        assert_eq!(Ticker::new(" msft ").as_str(), "MSFT");
    }

    #[test]
    fn test_filing_record_amendment() {
        let record = FilingRecord {
            cik: "0000320193".to_string(),
            accession: "0000320193-16-000100".to_string(),
            form_type: "10-K/A".to_string(),
            filing_date: NaiveDate::from_ymd_opt(2016, 3, 1).unwrap(),
            acceptance_datetime: NaiveDate::from_ymd_opt(2016, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            period_of_report: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            ticker: Ticker::new("AAPL"),
        };
        assert!(record.is_amendment());
    }

    #[test]
    fn test_coverage_ratio() {
        let report = CoverageReport {
            total_tickers: 4,
            found_tickers: vec![Ticker::new("AAPL"), Ticker::new("MSFT")],
            missing_tickers: vec![Ticker::new("FAKE"), Ticker::new("GONE")],
            ..Default::default()
        };
        assert!((report.coverage_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coverage_ratio_empty() {
        assert_eq!(CoverageReport::default().coverage_ratio(), 0.0);
    }

    #[test]
    fn test_data_source_str() {
        assert_eq!(DataSource::Edgar.as_str(), "edgar");
    }
}
