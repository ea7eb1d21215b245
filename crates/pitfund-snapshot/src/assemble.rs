//! Collects typed statement rows into schema-shaped DataFrames.
//!
//! Column order and dtypes come from the schemas in `pitfund-core`; date
//! columns are built as ISO strings and cast, datetimes as epoch
//! microseconds and cast. Running the same rows through twice produces
//! byte-identical frames.

use chrono::NaiveDateTime;
use pitfund_core::schema::{
    BALANCE_SCHEMA, CASHFLOW_SCHEMA, COMPANY_MASTER_SCHEMA, FILINGS_SCHEMA, INCOME_SCHEMA,
    TableSchema,
};
use pitfund_core::{
    BalanceRow, CashflowRow, DataSource, EngineError, FilingRecord, IncomeRow, Result, RowMeta,
};
use polars::prelude::*;

/// One row of the `company_master` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompanyRow {
    /// Equity ticker.
    pub ticker: pitfund_core::Ticker,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// SEC-registered company name.
    pub company_name: String,
    /// SIC code; not populated by the EDGAR pipeline.
    pub sic: Option<String>,
    /// Listing exchange; not populated by the EDGAR pipeline.
    pub exchange: Option<String>,
}

fn polars_err(e: PolarsError) -> EngineError {
    EngineError::Other(e.to_string())
}

/// Cast named string columns to `Date`.
fn cast_date_columns(df: DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut lf = df.lazy();
    for name in columns {
        lf = lf.with_column(col(*name).cast(DataType::Date));
    }
    lf.collect().map_err(polars_err)
}

fn meta_columns(metas: &[&RowMeta]) -> Vec<Column> {
    vec![
        Column::new(
            "ticker".into(),
            metas.iter().map(|m| m.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "cik".into(),
            metas.iter().map(|m| m.cik.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "accession".into(),
            metas.iter().map(|m| m.accession.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "asof_date".into(),
            metas.iter().map(|m| m.asof_date.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "period_end".into(),
            metas.iter().map(|m| m.period_end.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "source".into(),
            metas
                .iter()
                .map(|m| m.source.as_str().to_string())
                .collect::<Vec<_>>(),
        ),
    ]
}

pub(crate) fn statement_frame(
    schema: &TableSchema,
    metas: Vec<&RowMeta>,
    numeric: Vec<(&'static str, Vec<Option<f64>>)>,
) -> Result<DataFrame> {
    if metas.is_empty() {
        return Ok(schema.empty_frame());
    }
    let mut columns = meta_columns(&metas);
    for (name, values) in numeric {
        columns.push(Column::new(name.into(), values));
    }
    let df = DataFrame::new(columns).map_err(polars_err)?;
    let df = cast_date_columns(df, &["asof_date", "period_end"])?;
    debug_assert_eq!(
        df.get_column_names()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>(),
        schema.column_names()
    );
    Ok(df)
}

/// Assemble the `statements_income` table.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn income_frame(rows: &[IncomeRow]) -> Result<DataFrame> {
    statement_frame(
        &INCOME_SCHEMA,
        rows.iter().map(|r| &r.meta).collect(),
        vec![
            ("revenue", rows.iter().map(|r| r.revenue).collect()),
            ("cost_of_revenue", rows.iter().map(|r| r.cost_of_revenue).collect()),
            ("gross_profit", rows.iter().map(|r| r.gross_profit).collect()),
            ("operating_expenses", rows.iter().map(|r| r.operating_expenses).collect()),
            ("ebit", rows.iter().map(|r| r.ebit).collect()),
            ("ebitda", rows.iter().map(|r| r.ebitda).collect()),
            ("interest_expense", rows.iter().map(|r| r.interest_expense).collect()),
            ("pretax_income", rows.iter().map(|r| r.pretax_income).collect()),
            ("income_tax_expense", rows.iter().map(|r| r.income_tax_expense).collect()),
            ("net_income", rows.iter().map(|r| r.net_income).collect()),
            ("eps_basic", rows.iter().map(|r| r.eps_basic).collect()),
            ("eps_diluted", rows.iter().map(|r| r.eps_diluted).collect()),
            ("shares_basic", rows.iter().map(|r| r.shares_basic).collect()),
            ("shares_diluted", rows.iter().map(|r| r.shares_diluted).collect()),
        ],
    )
}

/// Assemble the `statements_balance` table.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn balance_frame(rows: &[BalanceRow]) -> Result<DataFrame> {
    statement_frame(
        &BALANCE_SCHEMA,
        rows.iter().map(|r| &r.meta).collect(),
        vec![
            ("cash_and_equivalents", rows.iter().map(|r| r.cash_and_equivalents).collect()),
            ("short_term_investments", rows.iter().map(|r| r.short_term_investments).collect()),
            ("accounts_receivable", rows.iter().map(|r| r.accounts_receivable).collect()),
            ("inventory", rows.iter().map(|r| r.inventory).collect()),
            ("current_assets", rows.iter().map(|r| r.current_assets).collect()),
            ("ppe_net", rows.iter().map(|r| r.ppe_net).collect()),
            ("goodwill", rows.iter().map(|r| r.goodwill).collect()),
            ("intangibles", rows.iter().map(|r| r.intangibles).collect()),
            ("total_assets", rows.iter().map(|r| r.total_assets).collect()),
            ("accounts_payable", rows.iter().map(|r| r.accounts_payable).collect()),
            ("short_term_debt", rows.iter().map(|r| r.short_term_debt).collect()),
            ("current_liabilities", rows.iter().map(|r| r.current_liabilities).collect()),
            ("long_term_debt", rows.iter().map(|r| r.long_term_debt).collect()),
            ("total_liabilities", rows.iter().map(|r| r.total_liabilities).collect()),
            ("common_equity", rows.iter().map(|r| r.common_equity).collect()),
            ("retained_earnings", rows.iter().map(|r| r.retained_earnings).collect()),
            ("total_equity", rows.iter().map(|r| r.total_equity).collect()),
        ],
    )
}

/// Assemble the `statements_cashflow` table.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn cashflow_frame(rows: &[CashflowRow]) -> Result<DataFrame> {
    statement_frame(
        &CASHFLOW_SCHEMA,
        rows.iter().map(|r| &r.meta).collect(),
        vec![
            ("cfo", rows.iter().map(|r| r.cfo).collect()),
            ("capex", rows.iter().map(|r| r.capex).collect()),
            ("free_cash_flow", rows.iter().map(|r| r.free_cash_flow).collect()),
            ("cfi", rows.iter().map(|r| r.cfi).collect()),
            ("cff", rows.iter().map(|r| r.cff).collect()),
            ("dividends_paid", rows.iter().map(|r| r.dividends_paid).collect()),
            ("share_repurchases", rows.iter().map(|r| r.share_repurchases).collect()),
            ("net_change_in_cash", rows.iter().map(|r| r.net_change_in_cash).collect()),
            (
                "depreciation_amortization",
                rows.iter().map(|r| r.depreciation_amortization).collect(),
            ),
            (
                "stock_based_compensation",
                rows.iter().map(|r| r.stock_based_compensation).collect(),
            ),
        ],
    )
}

/// Assemble the `filings` table from the selected filings.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn filings_frame(records: &[FilingRecord]) -> Result<DataFrame> {
    if records.is_empty() {
        return Ok(FILINGS_SCHEMA.empty_frame());
    }
    let acceptance_micros: Vec<i64> = records
        .iter()
        .map(|r| timestamp_micros(r.acceptance_datetime))
        .collect();

    let df = DataFrame::new(vec![
        Column::new(
            "ticker".into(),
            records.iter().map(|r| r.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "cik".into(),
            records.iter().map(|r| r.cik.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "accession".into(),
            records.iter().map(|r| r.accession.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "form_type".into(),
            records.iter().map(|r| r.form_type.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "filing_date".into(),
            records.iter().map(|r| r.filing_date.to_string()).collect::<Vec<_>>(),
        ),
        Column::new("acceptance_datetime".into(), acceptance_micros),
        Column::new(
            "period_of_report".into(),
            records
                .iter()
                .map(|r| r.period_of_report.to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "source".into(),
            vec![DataSource::Edgar.as_str().to_string(); records.len()],
        ),
    ])
    .map_err(polars_err)?;

    let df = df
        .lazy()
        .with_column(col("filing_date").cast(DataType::Date))
        .with_column(col("period_of_report").cast(DataType::Date))
        .with_column(
            col("acceptance_datetime").cast(DataType::Datetime(TimeUnit::Microseconds, None)),
        )
        .collect()
        .map_err(polars_err)?;
    Ok(df)
}

/// Assemble the `company_master` table.
///
/// # Errors
/// Propagates DataFrame construction failures.
pub fn company_master_frame(rows: &[CompanyRow]) -> Result<DataFrame> {
    if rows.is_empty() {
        return Ok(COMPANY_MASTER_SCHEMA.empty_frame());
    }
    DataFrame::new(vec![
        Column::new(
            "ticker".into(),
            rows.iter().map(|r| r.ticker.to_string()).collect::<Vec<_>>(),
        ),
        Column::new(
            "cik".into(),
            rows.iter().map(|r| r.cik.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "company_name".into(),
            rows.iter().map(|r| r.company_name.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "sic".into(),
            rows.iter().map(|r| r.sic.clone()).collect::<Vec<Option<String>>>(),
        ),
        Column::new(
            "exchange".into(),
            rows.iter().map(|r| r.exchange.clone()).collect::<Vec<Option<String>>>(),
        ),
    ])
    .map_err(polars_err)
}

fn timestamp_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}
