//! Filings index: fetches a company's submission history and applies the
//! point-in-time cutoff gate.
//!
//! This module hosts the central invariant of the whole engine: only
//! filings with `acceptance_datetime <= end of cutoff day` pass the gate,
//! and no downstream component may relax that. It also paginates the
//! older-filings archives the SEC splits long histories into, and filters
//! to the allowed form types.

use crate::client::EdgarClient;
use crate::urls::{submissions_archive_url, submissions_url};
use chrono::{NaiveDate, NaiveDateTime};
use pitfund_core::dates::{end_of_day, is_within_cutoff, parse_date, parse_datetime};
use pitfund_core::{EngineError, FilingRecord, PeriodType, Result, Ticker};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Annual report forms, amendments included.
pub const ANNUAL_FORMS: &[&str] = &["10-K", "10-K/A", "10-KT", "10-KT/A"];

/// Quarterly report forms, amendments included.
pub const QUARTERLY_FORMS: &[&str] = &["10-Q", "10-Q/A"];

/// Which form types the filings index lets through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormFilter {
    /// Annual forms only (10-K family).
    Annual,
    /// Quarterly forms only (10-Q family).
    Quarterly,
    /// Both annual and quarterly forms.
    All,
}

impl From<PeriodType> for FormFilter {
    fn from(period_type: PeriodType) -> Self {
        match period_type {
            PeriodType::Annual => Self::Annual,
            PeriodType::Quarterly => Self::Quarterly,
        }
    }
}

impl FormFilter {
    /// Whether a form type string passes this filter.
    #[must_use]
    pub fn allows(&self, form: &str, include_amendments: bool) -> bool {
        if !include_amendments && form.ends_with("/A") {
            return false;
        }
        match self {
            Self::Annual => ANNUAL_FORMS.contains(&form),
            Self::Quarterly => QUARTERLY_FORMS.contains(&form),
            Self::All => ANNUAL_FORMS.contains(&form) || QUARTERLY_FORMS.contains(&form),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionsResponse {
    #[serde(default)]
    filings: FilingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct FilingsSection {
    #[serde(default)]
    recent: FilingColumns,
    #[serde(default)]
    files: Vec<ArchiveRef>,
}

/// The SEC's parallel-array filing listing. Arrays are index-aligned;
/// a missing index skips that filing rather than failing the fetch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilingColumns {
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    acceptance_date_time: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    accession_number: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchiveRef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    filing_from: Option<String>,
    #[serde(default)]
    filing_to: Option<String>,
}

/// Fetches the filing history for one company and applies the PIT gate.
#[derive(Debug)]
pub struct FilingsIndex {
    client: Arc<EdgarClient>,
    include_amendments: bool,
}

impl FilingsIndex {
    /// Create an index on top of a configured client.
    #[must_use]
    pub const fn new(client: Arc<EdgarClient>, include_amendments: bool) -> Self {
        Self {
            client,
            include_amendments,
        }
    }

    /// Return all filings for a CIK that were knowable as of `cutoff`.
    ///
    /// Fetches the primary submissions blob plus any older-filings
    /// archives whose advertised range overlaps the cutoff, keeps only
    /// allowed forms accepted on or before the end of the cutoff day, and
    /// sorts by `period_of_report` descending.
    ///
    /// # Errors
    /// [`EngineError::FilingNotFound`] if nothing survives the gate;
    /// HTTP/parse errors from the submissions fetch.
    pub async fn fetch_filings(
        &self,
        cik: &str,
        ticker: &Ticker,
        cutoff: NaiveDate,
        filter: FormFilter,
    ) -> Result<Vec<FilingRecord>> {
        let url = submissions_url(cik);
        let raw = self.client.get_json(&url, None).await?;
        let submissions: SubmissionsResponse =
            serde_json::from_value(raw).map_err(|e| EngineError::Parse(e.to_string()))?;

        let mut records =
            self.parse_columns(&submissions.filings.recent, cik, ticker, cutoff, filter);

        for archive in &submissions.filings.files {
            if archive.name.is_empty() {
                continue;
            }
            if archive_is_after_cutoff(archive, cutoff) {
                debug!("Skipping archive {} (entirely after cutoff)", archive.name);
                continue;
            }
            match self.fetch_archive(&archive.name).await {
                Ok(columns) => {
                    let archived = self.parse_columns(&columns, cik, ticker, cutoff, filter);
                    debug!(
                        "Fetched {} qualifying filings from archive {} for {}",
                        archived.len(),
                        archive.name,
                        ticker
                    );
                    records.extend(archived);
                }
                Err(err) => {
                    warn!("Failed to fetch archive {}: {}", archive.name, err);
                }
            }
        }

        if records.is_empty() {
            return Err(EngineError::FilingNotFound {
                ticker: ticker.to_string(),
                cutoff,
            });
        }

        records.sort_by(|a, b| {
            b.period_of_report
                .cmp(&a.period_of_report)
                .then(b.acceptance_datetime.cmp(&a.acceptance_datetime))
        });

        info!(
            "Filings index: {} qualifying filings for {} (cik={}, cutoff={})",
            records.len(),
            ticker,
            cik,
            cutoff
        );
        Ok(records)
    }

    async fn fetch_archive(&self, archive_name: &str) -> Result<FilingColumns> {
        let url = submissions_archive_url(archive_name);
        let raw = self.client.get_json(&url, None).await?;
        // Archive blobs carry the parallel arrays at the root.
        serde_json::from_value(raw).map_err(|e| EngineError::Parse(e.to_string()))
    }

    fn parse_columns(
        &self,
        columns: &FilingColumns,
        cik: &str,
        ticker: &Ticker,
        cutoff: NaiveDate,
        filter: FormFilter,
    ) -> Vec<FilingRecord> {
        let mut records = Vec::new();

        for (i, form) in columns.form.iter().enumerate() {
            if !filter.allows(form, self.include_amendments) {
                continue;
            }

            let filing_date = columns
                .filing_date
                .get(i)
                .and_then(|s| parse_date(s));

            let Some(acceptance) =
                acceptance_or_fallback(columns.acceptance_date_time.get(i), filing_date)
            else {
                debug!("Skipping filing index={} for CIK={}: no usable dates", i, cik);
                continue;
            };

            // The PIT gate.
            if !is_within_cutoff(acceptance, cutoff) {
                continue;
            }

            let Some(period_end) = columns.report_date.get(i).and_then(|s| parse_date(s)) else {
                debug!("Skipping filing index={} for CIK={}: no report date", i, cik);
                continue;
            };

            let accession_raw = columns.accession_number.get(i).map(String::as_str);
            let Some(accession) = accession_raw.map(normalize_accession) else {
                debug!("Skipping filing index={} for CIK={}: no accession", i, cik);
                continue;
            };

            records.push(FilingRecord {
                cik: cik.to_string(),
                accession,
                form_type: form.clone(),
                filing_date: filing_date.unwrap_or(period_end),
                acceptance_datetime: acceptance,
                period_of_report: period_end,
                ticker: ticker.clone(),
            });
        }

        records
    }
}

/// Parse the acceptance stamp, falling back to end-of-day on the filing
/// date when it is missing or unusable.
fn acceptance_or_fallback(
    acceptance: Option<&String>,
    filing_date: Option<NaiveDate>,
) -> Option<NaiveDateTime> {
    acceptance
        .and_then(|s| parse_datetime(s))
        .or_else(|| filing_date.map(end_of_day))
}

/// Whether an archive's advertised range is entirely after the cutoff.
///
/// Missing or malformed range fields never skip the archive; in doubt it
/// is fetched and the per-filing gate decides.
fn archive_is_after_cutoff(archive: &ArchiveRef, cutoff: NaiveDate) -> bool {
    archive
        .filing_from
        .as_deref()
        .and_then(parse_date)
        .is_some_and(|from| from > cutoff)
}

/// Canonicalize an accession number to the dashed `NNNNNNNNNN-NN-NNNNNN`
/// form. Inputs that are not 18 digits after stripping pass through raw.
#[must_use]
pub fn normalize_accession(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    if digits.len() == 18 && digits.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &digits[..10], &digits[10..12], &digits[12..])
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn columns() -> FilingColumns {
        FilingColumns {
            form: vec![
                "10-K".to_string(),
                "10-K".to_string(),
                "8-K".to_string(),
                "10-K/A".to_string(),
            ],
            filing_date: vec![
                "2016-10-26".to_string(),
                "2017-02-01".to_string(),
                "2016-07-01".to_string(),
                "2016-03-01".to_string(),
            ],
            acceptance_date_time: vec![
                "2016-10-26T16:42:16.000Z".to_string(),
                "2017-02-01T08:00:00.000Z".to_string(),
                "2016-07-01T10:00:00.000Z".to_string(),
                "2016-03-01T12:00:00.000Z".to_string(),
            ],
            report_date: vec![
                "2016-09-24".to_string(),
                "2016-12-31".to_string(),
                "2016-06-30".to_string(),
                "2015-12-31".to_string(),
            ],
            accession_number: vec![
                "0000320193-16-000100".to_string(),
                "0000320193-17-000001".to_string(),
                "0000320193-16-000050".to_string(),
                "0000320193-16-000010".to_string(),
            ],
        }
    }

    fn index(include_amendments: bool) -> FilingsIndex {
        let config = pitfund_core::EngineConfig::new("Test/1.0 test@example.com").unwrap();
        let client = EdgarClient::with_cache(
            &config,
            std::sync::Arc::new(pitfund_cache::NoopResponseCache::new()),
        )
        .unwrap();
        FilingsIndex::new(Arc::new(client), include_amendments)
    }

    #[test]
    fn test_pit_gate_excludes_post_cutoff() {
        let records = index(true).parse_columns(
            &columns(),
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        // The 2017-02-01 filing is past the cutoff, the 8-K is filtered
        // by form; the 2016 10-K and the 10-K/A remain.
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| {
            r.acceptance_datetime <= end_of_day(date(2016, 12, 31))
        }));
    }

    #[test]
    fn test_amendments_stripped_when_disabled() {
        let records = index(false).parse_columns(
            &columns(),
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].form_type, "10-K");
    }

    #[test]
    fn test_acceptance_boundary_is_inclusive() {
        let mut cols = columns();
        cols.acceptance_date_time[0] = "2016-12-31T23:59:59".to_string();
        let records = index(true).parse_columns(
            &cols,
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        assert!(records.iter().any(|r| r.accession == "0000320193-16-000100"));

        cols.acceptance_date_time[0] = "2017-01-01T00:00:00".to_string();
        let records = index(true).parse_columns(
            &cols,
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        assert!(records.iter().all(|r| r.accession != "0000320193-16-000100"));
    }

    #[test]
    fn test_missing_acceptance_falls_back_to_filing_date_eod() {
        let mut cols = columns();
        cols.acceptance_date_time[0] = String::new();
        let records = index(true).parse_columns(
            &cols,
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        let record = records
            .iter()
            .find(|r| r.accession == "0000320193-16-000100")
            .unwrap();
        assert_eq!(record.acceptance_datetime, end_of_day(date(2016, 10, 26)));
    }

    #[test]
    fn test_index_misalignment_skips_filing() {
        let mut cols = columns();
        cols.report_date.truncate(1);
        let records = index(true).parse_columns(
            &cols,
            "0000320193",
            &Ticker::new("AAPL"),
            date(2016, 12, 31),
            FormFilter::Annual,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].period_of_report, date(2016, 9, 24));
    }

    #[test]
    fn test_normalize_accession() {
        assert_eq!(
            normalize_accession("000032019316000100"),
            "0000320193-16-000100"
        );
        assert_eq!(
            normalize_accession("0000320193-16-000100"),
            "0000320193-16-000100"
        );
        // Not 18 digits: passes through untouched.
        assert_eq!(normalize_accession("12345"), "12345");
    }

    #[test]
    fn test_archive_range_check() {
        let cutoff = date(2016, 12, 31);
        let newer = ArchiveRef {
            name: "a.json".to_string(),
            filing_from: Some("2017-01-01".to_string()),
            filing_to: Some("2019-12-31".to_string()),
        };
        assert!(archive_is_after_cutoff(&newer, cutoff));

        let overlapping = ArchiveRef {
            name: "b.json".to_string(),
            filing_from: Some("2014-01-01".to_string()),
            filing_to: Some("2017-06-30".to_string()),
        };
        assert!(!archive_is_after_cutoff(&overlapping, cutoff));

        // Malformed range must not skip the archive.
        let malformed = ArchiveRef {
            name: "c.json".to_string(),
            filing_from: Some("garbage".to_string()),
            filing_to: None,
        };
        assert!(!archive_is_after_cutoff(&malformed, cutoff));
    }

    #[test]
    fn test_form_filter() {
        assert!(FormFilter::Annual.allows("10-K", true));
        assert!(FormFilter::Annual.allows("10-KT/A", true));
        assert!(!FormFilter::Annual.allows("10-Q", true));
        assert!(!FormFilter::Annual.allows("10-K/A", false));
        assert!(FormFilter::Quarterly.allows("10-Q/A", true));
        assert!(FormFilter::All.allows("10-Q", true));
        assert!(FormFilter::All.allows("10-K", true));
        assert!(!FormFilter::All.allows("8-K", true));
    }
}
