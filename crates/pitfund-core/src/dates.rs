//! Point-in-time date utilities.
//!
//! Every cutoff comparison in the engine must flow through this module.
//! Business logic never compares acceptance datetimes against cutoff dates
//! directly; it calls [`is_within_cutoff`], which compares against the very
//! end of the cutoff day (23:59:59).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Duration window (in days, inclusive) that qualifies as an annual period.
///
/// The window tolerates 52/53-week fiscal calendars and transition periods.
pub const ANNUAL_PERIOD_DAYS: std::ops::RangeInclusive<i64> = 330..=400;

/// Duration window (in days, inclusive) that qualifies as a quarterly period.
pub const QUARTERLY_PERIOD_DAYS: std::ops::RangeInclusive<i64> = 75..=100;

/// Accepted calendar-date formats, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y"];

/// Accepted datetime formats, tried in order.
///
/// `%.f` also matches the absent-fraction case, covering the SEC's
/// `2016-10-26T16:42:16.000` acceptance stamps.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y%m%d%H%M%S"];

/// Parse a calendar date from the formats EDGAR uses.
///
/// Returns `None` for empty or unparsable input.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Parse a naive datetime from the formats EDGAR uses.
///
/// Trailing `Z` suffixes are stripped so acceptance timestamps come out
/// timezone-naive. A bare date parses to midnight of that day.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim().trim_end_matches('Z');
    if value.is_empty() {
        return None;
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }
    parse_date(value).map(|d| d.and_time(NaiveTime::MIN))
}

/// The last representable second of a calendar day.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time"))
}

/// The central point-in-time gate.
///
/// Returns `true` if `acceptance` is on or before the end of the cutoff
/// day. No data with an acceptance datetime after this instant may be used
/// anywhere downstream.
#[must_use]
pub fn is_within_cutoff(acceptance: NaiveDateTime, cutoff: NaiveDate) -> bool {
    acceptance <= end_of_day(cutoff)
}

/// Number of calendar days between two dates (absolute).
#[must_use]
pub fn day_distance(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

/// Whether a `[start, end]` interval looks like an annual reporting period.
///
/// Returns `false` when `start` is absent (instant context).
#[must_use]
pub fn is_annual_period(start: Option<NaiveDate>, end: NaiveDate) -> bool {
    start.is_some_and(|s| ANNUAL_PERIOD_DAYS.contains(&(end - s).num_days()))
}

/// Whether a `[start, end]` interval looks like a quarterly reporting period.
#[must_use]
pub fn is_quarterly_period(start: Option<NaiveDate>, end: NaiveDate) -> bool {
    start.is_some_and(|s| QUARTERLY_PERIOD_DAYS.contains(&(end - s).num_days()))
}
