//! XBRL context selection.
//!
//! One tag accumulates many candidate facts across contexts: different
//! period lengths, restatements re-reporting old periods, amendments, and
//! calendar frames. This module picks the single usable fact for a target
//! period end:
//!
//! 1. Period-type filter: instants have no start date; durations must
//!    span an annual (330-400 day) or quarterly (75-100 day) window.
//! 2. Cutoff filter: facts filed after the cutoff are discarded.
//! 3. Exact match on `end == period_end`, then a fuzzy fallback within
//!    seven days for fiscal calendars that drift across years.
//!
//! The `frame` label only exists on calendar-aligned facts, so it is
//! never a gate: a September-ending company has no frame on its annual
//! totals. It breaks ties among already-matched candidates, after which
//! the latest filing wins.

use chrono::NaiveDate;
use pitfund_core::dates::{day_distance, is_annual_period, is_quarterly_period};
use pitfund_core::{ContextType, PeriodType, XbrlFact};

/// Maximum distance (days) between a fact's end date and the requested
/// period end for the fuzzy fallback.
pub const FUZZY_MATCH_DAYS: i64 = 7;

/// Keep only facts matching the desired context and period type.
///
/// Instant contexts keep facts with no start date. Duration contexts keep
/// facts whose `[start, end]` interval fits the annual or quarterly
/// window; the window tolerates 52/53-week fiscal years.
#[must_use]
pub fn filter_by_period_type<'a>(
    facts: &'a [XbrlFact],
    context_type: ContextType,
    period_type: PeriodType,
) -> Vec<&'a XbrlFact> {
    facts
        .iter()
        .filter(|fact| match context_type {
            ContextType::Instant => fact.start.is_none(),
            ContextType::Duration => match period_type {
                PeriodType::Annual => is_annual_period(fact.start, fact.end),
                PeriodType::Quarterly => is_quarterly_period(fact.start, fact.end),
            },
        })
        .collect()
}

/// Select the best fact for a period end, honoring the cutoff.
///
/// Exact matches on `end == period_end` win; when none exist, the nearest
/// end within [`FUZZY_MATCH_DAYS`] is accepted. Within a match set,
/// framed facts are preferred and the most recently filed fact wins.
/// Facts filed after `cutoff` are never considered.
#[must_use]
pub fn best_fact_for_period<'a>(
    facts: &[&'a XbrlFact],
    period_end: NaiveDate,
    cutoff: NaiveDate,
) -> Option<&'a XbrlFact> {
    let knowable: Vec<&XbrlFact> = facts
        .iter()
        .copied()
        .filter(|fact| fact.filed <= cutoff)
        .collect();

    let exact: Vec<&XbrlFact> = knowable
        .iter()
        .copied()
        .filter(|fact| fact.end == period_end)
        .collect();
    if !exact.is_empty() {
        return pick_framed_then_latest(&exact);
    }

    let nearest = knowable
        .iter()
        .map(|fact| day_distance(fact.end, period_end))
        .filter(|d| *d <= FUZZY_MATCH_DAYS)
        .min()?;
    let fuzzy: Vec<&XbrlFact> = knowable
        .iter()
        .copied()
        .filter(|fact| day_distance(fact.end, period_end) == nearest)
        .collect();
    pick_framed_then_latest(&fuzzy)
}

/// Among matched candidates: restrict to framed facts when any exist,
/// then take the latest filed.
fn pick_framed_then_latest<'a>(candidates: &[&'a XbrlFact]) -> Option<&'a XbrlFact> {
    let framed: Vec<&XbrlFact> = candidates
        .iter()
        .copied()
        .filter(|fact| fact.frame.is_some())
        .collect();
    let pool = if framed.is_empty() {
        candidates
    } else {
        framed.as_slice()
    };
    pool.iter().copied().max_by_key(|fact| fact.filed)
}
