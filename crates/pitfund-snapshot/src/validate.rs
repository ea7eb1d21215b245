//! Schema and accounting-identity validation.
//!
//! Schema validation checks column presence, nullability, and key
//! uniqueness against the table schemas. Accounting checks append flag
//! columns (`identity_ok`, `cashflow_reconciles`) without dropping rows;
//! a failed identity is information, not grounds for discarding data.

use pitfund_core::{EngineError, Result, TableSchema};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Relative tolerance for the balance-sheet identity
/// `|assets - (liabilities + equity)| / |assets|`.
pub const BALANCE_SHEET_TOLERANCE: f64 = 0.01;

/// Relative tolerance for cash flow reconciliation.
pub const CASHFLOW_RELATIVE_TOLERANCE: f64 = 0.01;

/// Absolute floor for cash flow reconciliation, in dollars.
pub const CASHFLOW_ABSOLUTE_FLOOR: f64 = 1_000_000.0;

fn polars_err(e: PolarsError) -> EngineError {
    EngineError::Other(e.to_string())
}

/// Validate a table against its schema.
///
/// Returns the list of violations; empty means valid. Checks:
/// required column presence, no nulls in non-nullable columns, and key
/// uniqueness.
///
/// # Errors
/// Propagates column extraction failures.
pub fn validate_table(df: &DataFrame, schema: &TableSchema) -> Result<Vec<String>> {
    let mut violations = Vec::new();
    let present: HashSet<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();

    for name in schema.required_columns() {
        if !present.contains(name) {
            violations.push(format!("Missing required column: '{name}'"));
        }
    }

    for spec in &schema.columns {
        if spec.nullable || !present.contains(spec.name) {
            continue;
        }
        let nulls = df.column(spec.name).map_err(polars_err)?.null_count();
        if nulls > 0 {
            violations.push(format!(
                "Column '{}' is non-nullable but has {} null values",
                spec.name, nulls
            ));
        }
    }

    let key_columns: Vec<&str> = schema
        .key_columns
        .iter()
        .copied()
        .filter(|name| present.contains(name))
        .collect();
    if !key_columns.is_empty() && df.height() > 0 {
        let duplicates = count_duplicate_keys(df, &key_columns)?;
        if duplicates > 0 {
            violations.push(format!(
                "Key columns {key_columns:?} are not unique: {duplicates} duplicate rows"
            ));
        }
    }

    Ok(violations)
}

/// Validate a table and raise on violations.
///
/// # Errors
/// [`EngineError::SchemaValidation`] carrying the violation list.
pub fn assert_valid_table(df: &DataFrame, schema: &TableSchema) -> Result<()> {
    let violations = validate_table(df, schema)?;
    if !violations.is_empty() {
        return Err(EngineError::SchemaValidation {
            table: schema.name.to_string(),
            violations,
        });
    }
    debug!("Table '{}' passed schema validation ({} rows)", schema.name, df.height());
    Ok(())
}

fn count_duplicate_keys(df: &DataFrame, key_columns: &[&str]) -> Result<usize> {
    let mut rendered: Vec<Vec<Option<String>>> = Vec::with_capacity(key_columns.len());
    for name in key_columns {
        let column = df
            .column(name)
            .map_err(polars_err)?
            .cast(&DataType::String)
            .map_err(polars_err)?;
        let strings = column.str().map_err(polars_err)?;
        rendered.push(strings.iter().map(|v| v.map(str::to_string)).collect());
    }

    let mut seen = HashSet::with_capacity(df.height());
    let mut duplicates = 0usize;
    for i in 0..df.height() {
        let key: Vec<Option<String>> = rendered.iter().map(|col| col[i].clone()).collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }
    Ok(duplicates)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name).map_err(polars_err)?;
    let floats = column.f64().map_err(polars_err)?;
    Ok(floats.iter().collect())
}

/// Check the accounting identity `assets = liabilities + equity` and
/// append a nullable `identity_ok` column.
///
/// Rows missing any of the three totals get a null flag. Violations are
/// logged at warn and kept.
///
/// # Errors
/// Propagates column extraction failures.
pub fn check_balance_identity(mut df: DataFrame) -> Result<DataFrame> {
    let flags: Vec<Option<bool>> = if df.height() == 0 {
        Vec::new()
    } else {
        let assets = f64_values(&df, "total_assets")?;
        let liabilities = f64_values(&df, "total_liabilities")?;
        let equity = f64_values(&df, "total_equity")?;
        let tickers = df.column("ticker").map_err(polars_err)?.str().map_err(polars_err)?.clone();
        let accessions = df.column("accession").map_err(polars_err)?.str().map_err(polars_err)?.clone();

        (0..df.height())
            .map(|i| match (assets[i], liabilities[i], equity[i]) {
                (Some(a), Some(l), Some(e)) if a.abs() > 0.0 => {
                    let relative_error = (a - (l + e)).abs() / a.abs();
                    let ok = relative_error <= BALANCE_SHEET_TOLERANCE;
                    if !ok {
                        warn!(
                            "Balance sheet identity violation: ticker={} accession={} \
                             assets={:.0} liab+eq={:.0} rel_error={:.4}",
                            tickers.get(i).unwrap_or("?"),
                            accessions.get(i).unwrap_or("?"),
                            a,
                            l + e,
                            relative_error
                        );
                    }
                    Some(ok)
                }
                _ => None,
            })
            .collect()
    };

    df.with_column(Column::new("identity_ok".into(), flags))
        .map_err(polars_err)?;
    Ok(df)
}

/// Check `cfo + cfi + cff` against the reported net change in cash and
/// append a nullable `cashflow_reconciles` column.
///
/// Tolerance is 1% of the larger magnitude with a $1M absolute floor.
/// Rows missing any component get a null flag.
///
/// # Errors
/// Propagates column extraction failures.
pub fn check_cashflow_reconciliation(mut df: DataFrame) -> Result<DataFrame> {
    let flags: Vec<Option<bool>> = if df.height() == 0 {
        Vec::new()
    } else {
        let cfo = f64_values(&df, "cfo")?;
        let cfi = f64_values(&df, "cfi")?;
        let cff = f64_values(&df, "cff")?;
        let reported = f64_values(&df, "net_change_in_cash")?;
        let tickers = df.column("ticker").map_err(polars_err)?.str().map_err(polars_err)?.clone();
        let accessions = df.column("accession").map_err(polars_err)?.str().map_err(polars_err)?.clone();

        (0..df.height())
            .map(|i| match (cfo[i], cfi[i], cff[i], reported[i]) {
                (Some(cfo), Some(cfi), Some(cff), Some(reported)) => {
                    let computed = cfo + cfi + cff;
                    let diff = (computed - reported).abs();
                    let tolerance = (computed.abs().max(reported.abs())
                        * CASHFLOW_RELATIVE_TOLERANCE)
                        .max(CASHFLOW_ABSOLUTE_FLOOR);
                    let ok = diff <= tolerance;
                    if !ok {
                        warn!(
                            "Cash flow reconciliation error: ticker={} accession={} diff={:.0}",
                            tickers.get(i).unwrap_or("?"),
                            accessions.get(i).unwrap_or("?"),
                            diff
                        );
                    }
                    Some(ok)
                }
                _ => None,
            })
            .collect()
    };

    df.with_column(Column::new("cashflow_reconciles".into(), flags))
        .map_err(polars_err)?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{balance_frame, cashflow_frame, income_frame};
    use chrono::NaiveDate;
    use pitfund_core::schema::{BALANCE_SCHEMA, INCOME_SCHEMA};
    use pitfund_core::{BalanceRow, CashflowRow, DataSource, IncomeRow, RowMeta, Ticker};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meta(accession: &str, period: NaiveDate) -> RowMeta {
        RowMeta {
            ticker: Ticker::new("AAPL"),
            cik: "0000320193".to_string(),
            accession: accession.to_string(),
            asof_date: date(2017, 2, 1),
            period_end: period,
            source: DataSource::Edgar,
        }
    }

    fn balance_with_totals(
        accession: &str,
        assets: f64,
        liabilities: f64,
        equity: f64,
    ) -> BalanceRow {
        BalanceRow {
            total_assets: Some(assets),
            total_liabilities: Some(liabilities),
            total_equity: Some(equity),
            ..BalanceRow::empty(meta(accession, date(2016, 12, 31)))
        }
    }

    #[test]
    fn test_valid_table_has_no_violations() {
        let rows = vec![IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        }];
        let df = income_frame(&rows).unwrap();
        assert!(validate_table(&df, &INCOME_SCHEMA).unwrap().is_empty());
    }

    #[test]
    fn test_missing_column_is_violation() {
        let rows = vec![IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        }];
        let df = income_frame(&rows).unwrap();
        let df = df.drop("revenue").unwrap();

        let violations = validate_table(&df, &INCOME_SCHEMA).unwrap();
        assert!(violations.iter().any(|v| v.contains("revenue")));
        assert!(assert_valid_table(&df, &INCOME_SCHEMA).is_err());
    }

    #[test]
    fn test_duplicate_keys_are_violation() {
        let row = IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let df = income_frame(&[row.clone(), row]).unwrap();

        let violations = validate_table(&df, &INCOME_SCHEMA).unwrap();
        assert!(violations.iter().any(|v| v.contains("not unique")));
    }

    #[test]
    fn test_distinct_periods_are_not_duplicates() {
        let first = IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let second = IncomeRow {
            revenue: Some(900.0),
            ..IncomeRow::empty(meta("0000320193-16-000001", date(2015, 12, 31)))
        };
        let df = income_frame(&[first, second]).unwrap();
        assert!(validate_table(&df, &INCOME_SCHEMA).unwrap().is_empty());
    }

    #[test]
    fn test_identity_flag_true_within_tolerance() {
        let df = balance_frame(&[balance_with_totals(
            "0000320193-17-000001",
            100_000_000.0,
            80_000_000.0,
            20_000_000.0,
        )])
        .unwrap();
        let df = check_balance_identity(df).unwrap();

        let flags = df.column("identity_ok").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), Some(true));
    }

    #[test]
    fn test_identity_flag_false_beyond_tolerance() {
        // assets=100M, liab=80M, equity=10M: 10% relative error.
        let df = balance_frame(&[balance_with_totals(
            "0000320193-17-000001",
            100_000_000.0,
            80_000_000.0,
            10_000_000.0,
        )])
        .unwrap();
        let df = check_balance_identity(df).unwrap();

        let flags = df.column("identity_ok").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), Some(false));
    }

    #[test]
    fn test_identity_flag_null_when_total_missing() {
        let row = BalanceRow {
            total_assets: Some(100.0),
            ..BalanceRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let df = check_balance_identity(balance_frame(&[row]).unwrap()).unwrap();

        let flags = df.column("identity_ok").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), None);
    }

    #[test]
    fn test_cashflow_reconciliation_within_floor() {
        // Components sum to 430; reported 400. Diff 30 is far under the
        // $1M absolute floor.
        let row = CashflowRow {
            cfo: Some(900.0),
            cfi: Some(-250.0),
            cff: Some(-220.0),
            net_change_in_cash: Some(400.0),
            ..CashflowRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let df = check_cashflow_reconciliation(cashflow_frame(&[row]).unwrap()).unwrap();

        let flags = df.column("cashflow_reconciles").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), Some(true));
    }

    #[test]
    fn test_cashflow_reconciliation_fails_beyond_tolerance() {
        let row = CashflowRow {
            cfo: Some(900_000_000.0),
            cfi: Some(-250_000_000.0),
            cff: Some(-220_000_000.0),
            net_change_in_cash: Some(300_000_000.0),
            ..CashflowRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let df = check_cashflow_reconciliation(cashflow_frame(&[row]).unwrap()).unwrap();

        let flags = df.column("cashflow_reconciles").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), Some(false));
    }

    #[test]
    fn test_cashflow_reconciliation_null_when_component_missing() {
        let row = CashflowRow {
            cfo: Some(900.0),
            ..CashflowRow::empty(meta("0000320193-17-000001", date(2016, 12, 31)))
        };
        let df = check_cashflow_reconciliation(cashflow_frame(&[row]).unwrap()).unwrap();

        let flags = df.column("cashflow_reconciles").unwrap().bool().unwrap();
        assert_eq!(flags.get(0), None);
    }

    #[test]
    fn test_empty_frame_gets_flag_column() {
        let df = check_balance_identity(BALANCE_SCHEMA.empty_frame()).unwrap();
        assert!(df.column("identity_ok").is_ok());
        assert_eq!(df.height(), 0);
    }
}
