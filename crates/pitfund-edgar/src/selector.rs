//! Per-period filing selection.
//!
//! Given the PIT-filtered filing list, picks exactly one filing per
//! fiscal period: amendments win over originals when allowed, latest
//! acceptance wins within the candidate set. The cutoff gate is
//! re-asserted here as defense in depth; a breach raises
//! [`EngineError::CutoffViolation`] instead of being silently dropped.

use chrono::NaiveDate;
use pitfund_core::dates::end_of_day;
use pitfund_core::{EngineError, FilingRecord, Result};
use std::collections::BTreeMap;

/// Selects one filing per `period_of_report` from a PIT-filtered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilingSelector {
    allow_amendments: bool,
}

impl FilingSelector {
    /// Create a selector with the resolved amendment preference.
    #[must_use]
    pub const fn new(allow_amendments: bool) -> Self {
        Self { allow_amendments }
    }

    /// Select the best filing per fiscal period, sorted by period
    /// descending.
    ///
    /// # Errors
    /// Returns [`EngineError::CutoffViolation`] if any record carries an
    /// acceptance datetime past the end of the cutoff day. The upstream
    /// filings index should make this impossible; reaching it means the
    /// gate was bypassed.
    pub fn select(
        &self,
        filings: &[FilingRecord],
        cutoff: NaiveDate,
    ) -> Result<Vec<FilingRecord>> {
        let cutoff_end = end_of_day(cutoff);
        for record in filings {
            if record.acceptance_datetime > cutoff_end {
                return Err(EngineError::CutoffViolation {
                    ticker: record.ticker.to_string(),
                    accession: record.accession.clone(),
                    acceptance: record.acceptance_datetime,
                    cutoff,
                });
            }
        }

        let mut by_period: BTreeMap<NaiveDate, Vec<&FilingRecord>> = BTreeMap::new();
        for record in filings {
            by_period.entry(record.period_of_report).or_default().push(record);
        }

        // BTreeMap iterates ascending; reverse for period descending.
        let selected = by_period
            .into_values()
            .rev()
            .map(|candidates| self.pick_best(&candidates).clone())
            .collect();
        Ok(selected)
    }

    /// Among candidates for one period: restrict to amendments when
    /// allowed and present, then take the latest acceptance.
    fn pick_best<'a>(&self, candidates: &[&'a FilingRecord]) -> &'a FilingRecord {
        let pool: Vec<&FilingRecord> = if self.allow_amendments {
            let amendments: Vec<&FilingRecord> = candidates
                .iter()
                .copied()
                .filter(|r| r.is_amendment())
                .collect();
            if amendments.is_empty() {
                candidates.to_vec()
            } else {
                amendments
            }
        } else {
            candidates.to_vec()
        };

        pool.into_iter()
            .max_by_key(|r| r.acceptance_datetime)
            .expect("candidate groups are never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pitfund_core::Ticker;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn filing(
        period_end: NaiveDate,
        acceptance: NaiveDateTime,
        form: &str,
        accession: &str,
    ) -> FilingRecord {
        FilingRecord {
            cik: "0000320193".to_string(),
            accession: accession.to_string(),
            form_type: form.to_string(),
            filing_date: acceptance.date(),
            acceptance_datetime: acceptance,
            period_of_report: period_end,
            ticker: Ticker::new("AAPL"),
        }
    }

    #[test]
    fn test_prefers_amendment_over_original() {
        let original = filing(
            date(2015, 12, 31),
            datetime(2016, 2, 1, 12),
            "10-K",
            "0000320193-16-000001",
        );
        let amendment = filing(
            date(2015, 12, 31),
            datetime(2016, 3, 1, 12),
            "10-K/A",
            "0000320193-16-000002",
        );

        let selected = FilingSelector::new(true)
            .select(&[original, amendment], date(2016, 12, 31))
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].form_type, "10-K/A");
    }

    #[test]
    fn test_without_amendments_latest_acceptance_wins() {
        let first = filing(
            date(2015, 12, 31),
            datetime(2016, 2, 1, 12),
            "10-K",
            "0000320193-16-000001",
        );
        let second = filing(
            date(2015, 12, 31),
            datetime(2016, 3, 1, 12),
            "10-K",
            "0000320193-16-000003",
        );

        let selected = FilingSelector::new(false)
            .select(&[first, second], date(2016, 12, 31))
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].acceptance_datetime, datetime(2016, 3, 1, 12));
    }

    #[test]
    fn test_one_record_per_period_sorted_descending() {
        let filings = vec![
            filing(
                date(2014, 12, 31),
                datetime(2015, 2, 1, 12),
                "10-K",
                "0000320193-15-000001",
            ),
            filing(
                date(2016, 12, 31),
                datetime(2017, 2, 1, 12),
                "10-K",
                "0000320193-17-000001",
            ),
            filing(
                date(2015, 12, 31),
                datetime(2016, 2, 1, 12),
                "10-K",
                "0000320193-16-000001",
            ),
        ];

        let selected = FilingSelector::new(true)
            .select(&filings, date(2017, 12, 31))
            .unwrap();
        let periods: Vec<NaiveDate> = selected.iter().map(|r| r.period_of_report).collect();
        assert_eq!(
            periods,
            vec![date(2016, 12, 31), date(2015, 12, 31), date(2014, 12, 31)]
        );
    }

    #[test]
    fn test_cutoff_violation_raises() {
        let bad = filing(
            date(2016, 12, 31),
            date(2017, 1, 1).and_hms_opt(0, 0, 1).unwrap(),
            "10-K",
            "0000320193-17-000001",
        );

        let result = FilingSelector::new(true).select(&[bad], date(2016, 12, 31));
        assert!(matches!(result, Err(EngineError::CutoffViolation { .. })));
    }

    #[test]
    fn test_acceptance_at_end_of_cutoff_day_passes() {
        let boundary = filing(
            date(2016, 9, 24),
            date(2016, 12, 31).and_hms_opt(23, 59, 59).unwrap(),
            "10-K",
            "0000320193-16-000100",
        );

        let selected = FilingSelector::new(true)
            .select(&[boundary], date(2016, 12, 31))
            .unwrap();
        assert_eq!(selected.len(), 1);
    }
}
