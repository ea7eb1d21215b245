//! Typed statement rows.
//!
//! One struct per statement table, with explicit nullable numeric fields.
//! The field sets mirror the table schemas in [`crate::schema`]; the
//! schemas remain the single source of truth for column order and dtypes.

use crate::types::{DataSource, Ticker};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata shared by every statement row.
///
/// The key of a row is `(cik, accession, period_end)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    /// Equity ticker.
    pub ticker: Ticker,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Accession number of the filing this row came from.
    pub accession: String,
    /// The filing's acceptance date: when this row became knowable.
    pub asof_date: NaiveDate,
    /// Fiscal period end date.
    pub period_end: NaiveDate,
    /// Origin of the data.
    pub source: DataSource,
}

/// One standardized income statement row (duration context).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    /// Row identity and provenance.
    pub meta: RowMeta,
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Cost of revenue (COGS).
    pub cost_of_revenue: Option<f64>,
    /// Gross profit.
    pub gross_profit: Option<f64>,
    /// Operating expenses.
    pub operating_expenses: Option<f64>,
    /// Operating income (EBIT).
    pub ebit: Option<f64>,
    /// EBITDA, reported or derived as `ebit + depreciation_amortization`.
    pub ebitda: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,
    /// Income before taxes.
    pub pretax_income: Option<f64>,
    /// Income tax expense.
    pub income_tax_expense: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Basic earnings per share.
    pub eps_basic: Option<f64>,
    /// Diluted earnings per share.
    pub eps_diluted: Option<f64>,
    /// Weighted average basic shares outstanding.
    pub shares_basic: Option<f64>,
    /// Weighted average diluted shares outstanding.
    pub shares_diluted: Option<f64>,
}

impl IncomeRow {
    /// Creates an empty row carrying only metadata.
    #[must_use]
    pub const fn empty(meta: RowMeta) -> Self {
        Self {
            meta,
            revenue: None,
            cost_of_revenue: None,
            gross_profit: None,
            operating_expenses: None,
            ebit: None,
            ebitda: None,
            interest_expense: None,
            pretax_income: None,
            income_tax_expense: None,
            net_income: None,
            eps_basic: None,
            eps_diluted: None,
            shares_basic: None,
            shares_diluted: None,
        }
    }

    /// Whether any numeric field resolved.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.revenue.is_some()
            || self.cost_of_revenue.is_some()
            || self.gross_profit.is_some()
            || self.operating_expenses.is_some()
            || self.ebit.is_some()
            || self.ebitda.is_some()
            || self.interest_expense.is_some()
            || self.pretax_income.is_some()
            || self.income_tax_expense.is_some()
            || self.net_income.is_some()
            || self.eps_basic.is_some()
            || self.eps_diluted.is_some()
            || self.shares_basic.is_some()
            || self.shares_diluted.is_some()
    }
}

/// One standardized balance sheet row (instant context).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceRow {
    /// Row identity and provenance.
    pub meta: RowMeta,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Option<f64>,
    /// Short-term investments.
    pub short_term_investments: Option<f64>,
    /// Accounts receivable, net.
    pub accounts_receivable: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Total current assets.
    pub current_assets: Option<f64>,
    /// Property, plant and equipment, net.
    pub ppe_net: Option<f64>,
    /// Goodwill.
    pub goodwill: Option<f64>,
    /// Intangible assets excluding goodwill.
    pub intangibles: Option<f64>,
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Accounts payable.
    pub accounts_payable: Option<f64>,
    /// Short-term debt and the current portion of long-term debt.
    pub short_term_debt: Option<f64>,
    /// Total current liabilities.
    pub current_liabilities: Option<f64>,
    /// Long-term debt.
    pub long_term_debt: Option<f64>,
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Common stockholders' equity.
    pub common_equity: Option<f64>,
    /// Retained earnings (accumulated deficit).
    pub retained_earnings: Option<f64>,
    /// Total equity.
    pub total_equity: Option<f64>,
}

impl BalanceRow {
    /// Creates an empty row carrying only metadata.
    #[must_use]
    pub const fn empty(meta: RowMeta) -> Self {
        Self {
            meta,
            cash_and_equivalents: None,
            short_term_investments: None,
            accounts_receivable: None,
            inventory: None,
            current_assets: None,
            ppe_net: None,
            goodwill: None,
            intangibles: None,
            total_assets: None,
            accounts_payable: None,
            short_term_debt: None,
            current_liabilities: None,
            long_term_debt: None,
            total_liabilities: None,
            common_equity: None,
            retained_earnings: None,
            total_equity: None,
        }
    }

    /// Whether any numeric field resolved.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.cash_and_equivalents.is_some()
            || self.short_term_investments.is_some()
            || self.accounts_receivable.is_some()
            || self.inventory.is_some()
            || self.current_assets.is_some()
            || self.ppe_net.is_some()
            || self.goodwill.is_some()
            || self.intangibles.is_some()
            || self.total_assets.is_some()
            || self.accounts_payable.is_some()
            || self.short_term_debt.is_some()
            || self.current_liabilities.is_some()
            || self.long_term_debt.is_some()
            || self.total_liabilities.is_some()
            || self.common_equity.is_some()
            || self.retained_earnings.is_some()
            || self.total_equity.is_some()
    }
}

/// One standardized cash flow row (duration context).
///
/// `capex`, `dividends_paid`, and `share_repurchases` are stored as
/// positive magnitudes regardless of reported sign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashflowRow {
    /// Row identity and provenance.
    pub meta: RowMeta,
    /// Net cash from operating activities.
    pub cfo: Option<f64>,
    /// Capital expenditures (positive magnitude).
    pub capex: Option<f64>,
    /// Free cash flow, `cfo - capex` when both are present.
    pub free_cash_flow: Option<f64>,
    /// Net cash from investing activities.
    pub cfi: Option<f64>,
    /// Net cash from financing activities.
    pub cff: Option<f64>,
    /// Dividends paid (positive magnitude).
    pub dividends_paid: Option<f64>,
    /// Common stock repurchases (positive magnitude).
    pub share_repurchases: Option<f64>,
    /// Net change in cash over the period.
    pub net_change_in_cash: Option<f64>,
    /// Depreciation and amortization.
    pub depreciation_amortization: Option<f64>,
    /// Stock-based compensation expense.
    pub stock_based_compensation: Option<f64>,
}

impl CashflowRow {
    /// Creates an empty row carrying only metadata.
    #[must_use]
    pub const fn empty(meta: RowMeta) -> Self {
        Self {
            meta,
            cfo: None,
            capex: None,
            free_cash_flow: None,
            cfi: None,
            cff: None,
            dividends_paid: None,
            share_repurchases: None,
            net_change_in_cash: None,
            depreciation_amortization: None,
            stock_based_compensation: None,
        }
    }

    /// Whether any numeric field resolved.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.cfo.is_some()
            || self.capex.is_some()
            || self.free_cash_flow.is_some()
            || self.cfi.is_some()
            || self.cff.is_some()
            || self.dividends_paid.is_some()
            || self.share_repurchases.is_some()
            || self.net_change_in_cash.is_some()
            || self.depreciation_amortization.is_some()
            || self.stock_based_compensation.is_some()
    }
}

/// One derived metrics row, joined on `(cik, period_end)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    /// Row identity and provenance (from the income row that seeded it).
    pub meta: RowMeta,
    /// `gross_profit / revenue`.
    pub gross_margin: Option<f64>,
    /// `ebit / revenue`.
    pub ebit_margin: Option<f64>,
    /// `net_income / revenue`.
    pub net_margin: Option<f64>,
    /// `net_income / total_assets`.
    pub roa: Option<f64>,
    /// `net_income / total_equity`.
    pub roe: Option<f64>,
    /// Return on invested capital; requires data outside the pipeline.
    pub roic: Option<f64>,
    /// `current_assets / current_liabilities`.
    pub current_ratio: Option<f64>,
    /// `(current_assets - inventory) / current_liabilities`.
    pub quick_ratio: Option<f64>,
    /// `long_term_debt / total_equity`.
    pub debt_to_equity: Option<f64>,
    /// `long_term_debt + short_term_debt - cash_and_equivalents`.
    pub net_debt: Option<f64>,
    /// Free cash flow yield; requires price data.
    pub fcf_yield: Option<f64>,
}

impl DerivedRow {
    /// Creates an empty row carrying only metadata.
    #[must_use]
    pub const fn empty(meta: RowMeta) -> Self {
        Self {
            meta,
            gross_margin: None,
            ebit_margin: None,
            net_margin: None,
            roa: None,
            roe: None,
            roic: None,
            current_ratio: None,
            quick_ratio: None,
            debt_to_equity: None,
            net_debt: None,
            fcf_yield: None,
        }
    }
}
