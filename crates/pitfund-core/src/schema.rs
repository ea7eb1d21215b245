//! Canonical schema definitions for all standardized output tables.
//!
//! Each table is a [`TableSchema`] with ordered column specifications and
//! the key columns that must be unique. These schemas drive both the
//! in-memory DataFrame shape and downstream serialization; assemblers and
//! validators take their column order from here and nowhere else.

use once_cell::sync::Lazy;
use polars::prelude::{DataFrame, DataType, PlSmallStr, Series, TimeUnit};

/// Specification for a single table column.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: &'static str,
    /// Polars dtype of the column.
    pub dtype: DataType,
    /// Column must be present in the table.
    pub required: bool,
    /// Null values are permitted.
    pub nullable: bool,
}

impl ColumnSpec {
    fn new(name: &'static str, dtype: DataType) -> Self {
        Self {
            name,
            dtype,
            required: true,
            nullable: true,
        }
    }

    fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Full schema for a named output table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableSchema {
    /// Canonical table name (e.g. `statements_income`).
    pub name: &'static str,
    /// Columns that together identify a row.
    pub key_columns: &'static [&'static str],
    /// All column specifications, in output order.
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Names of all columns, in output order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Names of the columns that must be present.
    #[must_use]
    pub fn required_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name)
            .collect()
    }

    /// An empty DataFrame with the correct column names and dtypes.
    #[must_use]
    pub fn empty_frame(&self) -> DataFrame {
        let columns = self
            .columns
            .iter()
            .map(|c| Series::new_empty(PlSmallStr::from(c.name), &c.dtype).into())
            .collect();
        DataFrame::new(columns).expect("schema columns are distinct")
    }
}

fn dt_datetime() -> DataType {
    DataType::Datetime(TimeUnit::Microseconds, None)
}

fn meta_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec::new("ticker", DataType::String).non_nullable(),
        ColumnSpec::new("cik", DataType::String).non_nullable(),
        ColumnSpec::new("accession", DataType::String).non_nullable(),
        ColumnSpec::new("asof_date", DataType::Date).non_nullable(),
        ColumnSpec::new("period_end", DataType::Date).non_nullable(),
        ColumnSpec::new("source", DataType::String).non_nullable(),
    ]
}

fn float_columns(names: &[&'static str]) -> impl Iterator<Item = ColumnSpec> {
    names
        .iter()
        .map(|name| ColumnSpec::new(name, DataType::Float64))
        .collect::<Vec<_>>()
        .into_iter()
}

/// Schema of the `company_master` table.
pub static COMPANY_MASTER_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "company_master",
    key_columns: &["cik"],
    columns: vec![
        ColumnSpec::new("ticker", DataType::String).non_nullable(),
        ColumnSpec::new("cik", DataType::String).non_nullable(),
        ColumnSpec::new("company_name", DataType::String),
        ColumnSpec::new("sic", DataType::String),
        ColumnSpec::new("exchange", DataType::String),
    ],
});

/// Schema of the `filings` table.
pub static FILINGS_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "filings",
    key_columns: &["cik", "accession"],
    columns: vec![
        ColumnSpec::new("ticker", DataType::String).non_nullable(),
        ColumnSpec::new("cik", DataType::String).non_nullable(),
        ColumnSpec::new("accession", DataType::String).non_nullable(),
        ColumnSpec::new("form_type", DataType::String).non_nullable(),
        ColumnSpec::new("filing_date", DataType::Date).non_nullable(),
        ColumnSpec::new("acceptance_datetime", dt_datetime()).non_nullable(),
        ColumnSpec::new("period_of_report", DataType::Date).non_nullable(),
        ColumnSpec::new("source", DataType::String).non_nullable(),
    ],
});

/// Schema of the `statements_income` table.
pub static INCOME_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "statements_income",
    key_columns: &["cik", "accession", "period_end"],
    columns: meta_columns()
        .into_iter()
        .chain(float_columns(&[
            "revenue",
            "cost_of_revenue",
            "gross_profit",
            "operating_expenses",
            "ebit",
            "ebitda",
            "interest_expense",
            "pretax_income",
            "income_tax_expense",
            "net_income",
            "eps_basic",
            "eps_diluted",
            "shares_basic",
            "shares_diluted",
        ]))
        .collect(),
});

/// Schema of the `statements_balance` table.
pub static BALANCE_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "statements_balance",
    key_columns: &["cik", "accession", "period_end"],
    columns: meta_columns()
        .into_iter()
        .chain(float_columns(&[
            "cash_and_equivalents",
            "short_term_investments",
            "accounts_receivable",
            "inventory",
            "current_assets",
            "ppe_net",
            "goodwill",
            "intangibles",
            "total_assets",
            "accounts_payable",
            "short_term_debt",
            "current_liabilities",
            "long_term_debt",
            "total_liabilities",
            "common_equity",
            "retained_earnings",
            "total_equity",
        ]))
        .collect(),
});

/// Schema of the `statements_cashflow` table.
pub static CASHFLOW_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "statements_cashflow",
    key_columns: &["cik", "accession", "period_end"],
    columns: meta_columns()
        .into_iter()
        .chain(float_columns(&[
            "cfo",
            "capex",
            "free_cash_flow",
            "cfi",
            "cff",
            "dividends_paid",
            "share_repurchases",
            "net_change_in_cash",
            "depreciation_amortization",
            "stock_based_compensation",
        ]))
        .collect(),
});

/// Schema of the `derived_metrics` table.
pub static DERIVED_SCHEMA: Lazy<TableSchema> = Lazy::new(|| TableSchema {
    name: "derived_metrics",
    key_columns: &["cik", "accession", "period_end"],
    columns: meta_columns()
        .into_iter()
        .chain(float_columns(&[
            "gross_margin",
            "ebit_margin",
            "net_margin",
            "roa",
            "roe",
            "roic",
            "current_ratio",
            "quick_ratio",
            "debt_to_equity",
            "net_debt",
            "fcf_yield",
        ]))
        .collect(),
});

/// Look up a table schema by canonical name.
#[must_use]
pub fn schema_for(table: &str) -> Option<&'static TableSchema> {
    match table {
        "company_master" => Some(&COMPANY_MASTER_SCHEMA),
        "filings" => Some(&FILINGS_SCHEMA),
        "statements_income" => Some(&INCOME_SCHEMA),
        "statements_balance" => Some(&BALANCE_SCHEMA),
        "statements_cashflow" => Some(&CASHFLOW_SCHEMA),
        "derived_metrics" => Some(&DERIVED_SCHEMA),
        _ => None,
    }
}
