//! Coverage report generation.
//!
//! Documents which requested tickers produced rows, per-statement and
//! per-ticker fill ratios over the data columns, and which fields never
//! resolved at all.

use pitfund_core::schema::{BALANCE_SCHEMA, CASHFLOW_SCHEMA, INCOME_SCHEMA, TableSchema};
use pitfund_core::{CoverageReport, EngineError, Result, StatementCoverage, Ticker};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Meta columns excluded from fill-ratio accounting.
const META_COLS: &[&str] = &["ticker", "cik", "accession", "asof_date", "period_end", "source"];

fn polars_err(e: PolarsError) -> EngineError {
    EngineError::Other(e.to_string())
}

fn data_columns(schema: &TableSchema) -> Vec<&'static str> {
    schema
        .column_names()
        .into_iter()
        .filter(|name| !META_COLS.contains(name))
        .collect()
}

struct TableFill {
    rows: usize,
    cells: usize,
    filled: usize,
    /// Non-null counts per data column.
    per_column: Vec<(String, usize)>,
}

fn table_fill(df: &DataFrame, columns: &[&'static str], row_indices: Option<&[usize]>) -> Result<TableFill> {
    let rows = row_indices.map_or(df.height(), <[usize]>::len);
    let mut per_column = Vec::with_capacity(columns.len());
    let mut filled = 0usize;

    for name in columns {
        let column = df.column(name).map_err(polars_err)?;
        let floats = column.f64().map_err(polars_err)?;
        let non_null = match row_indices {
            None => rows - column.null_count(),
            Some(indices) => indices.iter().filter(|i| floats.get(**i).is_some()).count(),
        };
        filled += non_null;
        per_column.push(((*name).to_string(), non_null));
    }

    Ok(TableFill {
        rows,
        cells: rows * columns.len(),
        filled,
        per_column,
    })
}

fn statement_coverage(fill: &TableFill, columns: &[&'static str]) -> StatementCoverage {
    let missing_fields = if fill.rows == 0 {
        columns.iter().map(|c| (*c).to_string()).collect()
    } else {
        fill.per_column
            .iter()
            .filter(|(_, non_null)| *non_null == 0)
            .map(|(name, _)| name.clone())
            .collect()
    };
    StatementCoverage {
        rows: fill.rows,
        fill_ratio: if fill.cells == 0 {
            0.0
        } else {
            fill.filled as f64 / fill.cells as f64
        },
        missing_fields,
    }
}

fn ticker_values(df: &DataFrame) -> Result<Vec<String>> {
    if df.height() == 0 {
        return Ok(Vec::new());
    }
    let tickers = df.column("ticker").map_err(polars_err)?.str().map_err(polars_err)?;
    Ok(tickers
        .iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Build the coverage report for a completed snapshot.
///
/// # Errors
/// Propagates column extraction failures.
pub fn build_coverage_report(
    requested: &[Ticker],
    income: &DataFrame,
    balance: &DataFrame,
    cashflow: &DataFrame,
    filing_counts: HashMap<Ticker, usize>,
) -> Result<CoverageReport> {
    let tables: [(&str, &DataFrame, &TableSchema); 3] = [
        ("income", income, &INCOME_SCHEMA),
        ("balance", balance, &BALANCE_SCHEMA),
        ("cashflow", cashflow, &CASHFLOW_SCHEMA),
    ];

    let mut present: HashSet<String> = HashSet::new();
    for (_, df, _) in &tables {
        present.extend(ticker_values(df)?);
    }

    let found: Vec<Ticker> = requested
        .iter()
        .filter(|t| present.contains(t.as_str()))
        .cloned()
        .collect();
    let missing: Vec<Ticker> = requested
        .iter()
        .filter(|t| !present.contains(t.as_str()))
        .cloned()
        .collect();

    let mut statement_coverage_map = HashMap::new();
    let mut ticker_coverage: HashMap<Ticker, HashMap<String, StatementCoverage>> =
        found.iter().map(|t| (t.clone(), HashMap::new())).collect();
    let mut total_cells = 0usize;
    let mut total_filled = 0usize;

    for (name, df, schema) in &tables {
        let columns = data_columns(schema);
        let fill = table_fill(df, &columns, None)?;
        total_cells += fill.cells;
        total_filled += fill.filled;
        statement_coverage_map.insert((*name).to_string(), statement_coverage(&fill, &columns));

        let tickers = ticker_values(df)?;
        for ticker in &found {
            let indices: Vec<usize> = tickers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.as_str() == ticker.as_str())
                .map(|(i, _)| i)
                .collect();
            let fill = table_fill(df, &columns, Some(&indices))?;
            if let Some(per_ticker) = ticker_coverage.get_mut(ticker) {
                per_ticker.insert((*name).to_string(), statement_coverage(&fill, &columns));
            }
        }
    }

    let report = CoverageReport {
        total_tickers: requested.len(),
        found_tickers: found,
        missing_tickers: missing,
        filing_counts,
        statement_coverage: statement_coverage_map,
        ticker_coverage,
        overall_fill_ratio: if total_cells == 0 {
            0.0
        } else {
            total_filled as f64 / total_cells as f64
        },
    };

    info!(
        "Coverage: {}/{} tickers found ({:.1}%)",
        report.found_tickers.len(),
        report.total_tickers,
        report.coverage_ratio() * 100.0
    );
    if !report.missing_tickers.is_empty() {
        warn!("Missing tickers: {:?}", report.missing_tickers);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::{balance_frame, cashflow_frame, income_frame};
    use chrono::NaiveDate;
    use pitfund_core::{DataSource, IncomeRow, RowMeta};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn meta(ticker: &str, accession: &str) -> RowMeta {
        RowMeta {
            ticker: Ticker::new(ticker),
            cik: "0000320193".to_string(),
            accession: accession.to_string(),
            asof_date: date(2017, 2, 1),
            period_end: date(2016, 12, 31),
            source: DataSource::Edgar,
        }
    }

    #[test]
    fn test_found_and_missing_tickers() {
        let income = income_frame(&[IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("AAPL", "0000320193-17-000001"))
        }])
        .unwrap();
        let balance = balance_frame(&[]).unwrap();
        let cashflow = cashflow_frame(&[]).unwrap();

        let requested = vec![Ticker::new("AAPL"), Ticker::new("FAKE")];
        let report =
            build_coverage_report(&requested, &income, &balance, &cashflow, HashMap::new())
                .unwrap();

        assert_eq!(report.total_tickers, 2);
        assert_eq!(report.found_tickers, vec![Ticker::new("AAPL")]);
        assert_eq!(report.missing_tickers, vec![Ticker::new("FAKE")]);
        assert!((report.coverage_ratio() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fill_ratio_counts_data_cells_only() {
        // One row with exactly one of fourteen income data fields set.
        let income = income_frame(&[IncomeRow {
            revenue: Some(1000.0),
            ..IncomeRow::empty(meta("AAPL", "0000320193-17-000001"))
        }])
        .unwrap();
        let report = build_coverage_report(
            &[Ticker::new("AAPL")],
            &income,
            &balance_frame(&[]).unwrap(),
            &cashflow_frame(&[]).unwrap(),
            HashMap::new(),
        )
        .unwrap();

        let income_cov = &report.statement_coverage["income"];
        assert_eq!(income_cov.rows, 1);
        assert!((income_cov.fill_ratio - 1.0 / 14.0).abs() < 1e-12);
        assert!(income_cov.missing_fields.contains(&"net_income".to_string()));
        assert!(!income_cov.missing_fields.contains(&"revenue".to_string()));
    }

    #[test]
    fn test_empty_statement_reports_all_fields_missing() {
        let report = build_coverage_report(
            &[Ticker::new("AAPL")],
            &income_frame(&[]).unwrap(),
            &balance_frame(&[]).unwrap(),
            &cashflow_frame(&[]).unwrap(),
            HashMap::new(),
        )
        .unwrap();

        let balance_cov = &report.statement_coverage["balance"];
        assert_eq!(balance_cov.rows, 0);
        assert_eq!(balance_cov.fill_ratio, 0.0);
        assert!(balance_cov.missing_fields.contains(&"total_assets".to_string()));
        assert!(report.found_tickers.is_empty());
    }

    #[test]
    fn test_per_ticker_breakdown() {
        let income = income_frame(&[
            IncomeRow {
                revenue: Some(1000.0),
                net_income: Some(100.0),
                ..IncomeRow::empty(meta("AAPL", "0000320193-17-000001"))
            },
            IncomeRow {
                revenue: Some(2000.0),
                ..IncomeRow::empty(meta("MSFT", "0000789019-17-000001"))
            },
        ])
        .unwrap();

        let requested = vec![Ticker::new("AAPL"), Ticker::new("MSFT")];
        let report = build_coverage_report(
            &requested,
            &income,
            &balance_frame(&[]).unwrap(),
            &cashflow_frame(&[]).unwrap(),
            HashMap::new(),
        )
        .unwrap();

        let aapl = &report.ticker_coverage[&Ticker::new("AAPL")]["income"];
        let msft = &report.ticker_coverage[&Ticker::new("MSFT")]["income"];
        assert_eq!(aapl.rows, 1);
        assert!((aapl.fill_ratio - 2.0 / 14.0).abs() < 1e-12);
        assert!((msft.fill_ratio - 1.0 / 14.0).abs() < 1e-12);
    }
}
