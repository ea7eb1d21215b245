//! Derived metrics computed on the joined statement rows.
//!
//! Rows are seeded from the income table and joined against balance rows
//! on `(cik, period_end)`. Every ratio returns null when its denominator
//! is null or has absolute value zero.

use pitfund_core::{BalanceRow, DerivedRow, IncomeRow};
use std::collections::HashMap;

/// `numerator / denominator`, null on missing or zero denominator.
fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d.abs() > 0.0 => Some(n / d),
        _ => None,
    }
}

/// `long_term_debt + short_term_debt - cash_and_equivalents`.
///
/// Missing summands count as zero as long as at least one debt component
/// is present; with neither debt component the result is null.
fn net_debt(
    long_term_debt: Option<f64>,
    short_term_debt: Option<f64>,
    cash: Option<f64>,
) -> Option<f64> {
    if long_term_debt.is_none() && short_term_debt.is_none() {
        return None;
    }
    Some(long_term_debt.unwrap_or(0.0) + short_term_debt.unwrap_or(0.0) - cash.unwrap_or(0.0))
}

/// Compute derived rows for every income row, joining balance data by
/// `(cik, period_end)`.
#[must_use]
pub fn derived_rows(income: &[IncomeRow], balance: &[BalanceRow]) -> Vec<DerivedRow> {
    let balance_by_key: HashMap<(&str, chrono::NaiveDate), &BalanceRow> = balance
        .iter()
        .map(|row| ((row.meta.cik.as_str(), row.meta.period_end), row))
        .collect();

    income
        .iter()
        .map(|inc| {
            let key = (inc.meta.cik.as_str(), inc.meta.period_end);
            let bal = balance_by_key.get(&key);

            let mut row = DerivedRow::empty(inc.meta.clone());
            row.gross_margin = safe_div(inc.gross_profit, inc.revenue);
            row.ebit_margin = safe_div(inc.ebit, inc.revenue);
            row.net_margin = safe_div(inc.net_income, inc.revenue);

            if let Some(bal) = bal {
                row.roa = safe_div(inc.net_income, bal.total_assets);
                row.roe = safe_div(inc.net_income, bal.total_equity);
                row.current_ratio = safe_div(bal.current_assets, bal.current_liabilities);
                row.quick_ratio = safe_div(
                    bal.current_assets
                        .map(|ca| ca - bal.inventory.unwrap_or(0.0)),
                    bal.current_liabilities,
                );
                row.debt_to_equity = safe_div(bal.long_term_debt, bal.total_equity);
                row.net_debt = net_debt(
                    bal.long_term_debt,
                    bal.short_term_debt,
                    bal.cash_and_equivalents,
                );
            }

            // roic and fcf_yield need invested-capital and price data the
            // pipeline does not carry; the columns stay null.
            row
        })
        .collect()
}

/// Assemble the `derived_metrics` table.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn derived_frame(rows: &[DerivedRow]) -> pitfund_core::Result<polars::prelude::DataFrame> {
    use crate::assemble::statement_frame;
    use pitfund_core::schema::DERIVED_SCHEMA;

    statement_frame(
        &DERIVED_SCHEMA,
        rows.iter().map(|r| &r.meta).collect(),
        vec![
            ("gross_margin", rows.iter().map(|r| r.gross_margin).collect()),
            ("ebit_margin", rows.iter().map(|r| r.ebit_margin).collect()),
            ("net_margin", rows.iter().map(|r| r.net_margin).collect()),
            ("roa", rows.iter().map(|r| r.roa).collect()),
            ("roe", rows.iter().map(|r| r.roe).collect()),
            ("roic", rows.iter().map(|r| r.roic).collect()),
            ("current_ratio", rows.iter().map(|r| r.current_ratio).collect()),
            ("quick_ratio", rows.iter().map(|r| r.quick_ratio).collect()),
            ("debt_to_equity", rows.iter().map(|r| r.debt_to_equity).collect()),
            ("net_debt", rows.iter().map(|r| r.net_debt).collect()),
            ("fcf_yield", rows.iter().map(|r| r.fcf_yield).collect()),
        ],
    )
}
