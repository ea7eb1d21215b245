//! Assembles standardized statement rows from XBRL facts.
//!
//! One builder invocation per selected filing and statement. Each builder
//! resolves its statement's fields through the tag priority map and
//! applies the statement-specific fallbacks:
//!
//! - Income: `ebitda = ebit + depreciation_amortization` when EBITDA is
//!   not reported directly. D&A lives on the cashflow statement in the
//!   tag map, so companies reporting it only there can produce EBITDA
//!   values that differ from analyst-adjusted figures.
//! - Balance: the missing one of assets / liabilities / equity is
//!   recovered from the accounting identity.
//! - Cashflow: sign-flipped items are stored as positive magnitudes and
//!   `free_cash_flow = cfo - capex` is derived.
//!
//! A builder returns `None` when nothing resolved, and the row is dropped.

use crate::mapper::resolve_field;
use chrono::NaiveDate;
use pitfund_core::{
    BalanceRow, CashflowRow, DataSource, FactTable, FilingRecord, IncomeRow, PeriodType, RowMeta,
    Ticker,
};
use tracing::debug;

/// Builds standardized rows for one company from its fact table.
#[derive(Clone, Debug)]
pub struct StatementParser {
    ticker: Ticker,
    cik: String,
}

impl StatementParser {
    /// Create a parser for one company.
    #[must_use]
    pub const fn new(ticker: Ticker, cik: String) -> Self {
        Self { ticker, cik }
    }

    fn meta(&self, filing: &FilingRecord) -> RowMeta {
        RowMeta {
            ticker: self.ticker.clone(),
            cik: self.cik.clone(),
            accession: filing.accession.clone(),
            asof_date: filing.acceptance_datetime.date(),
            period_end: filing.period_of_report,
            source: DataSource::Edgar,
        }
    }

    /// Build the income row for one filing, or `None` if no field resolved.
    #[must_use]
    pub fn build_income_row(
        &self,
        facts: &FactTable,
        filing: &FilingRecord,
        cutoff: NaiveDate,
        period_type: PeriodType,
    ) -> Option<IncomeRow> {
        let period_end = filing.period_of_report;
        let resolve = |field: &str| resolve_field(field, facts, period_end, cutoff, period_type);

        let mut row = IncomeRow::empty(self.meta(filing));
        row.revenue = resolve("revenue");
        row.cost_of_revenue = resolve("cost_of_revenue");
        row.gross_profit = resolve("gross_profit");
        row.operating_expenses = resolve("operating_expenses");
        row.ebit = resolve("ebit");
        row.ebitda = resolve("ebitda");
        row.interest_expense = resolve("interest_expense");
        row.pretax_income = resolve("pretax_income");
        row.income_tax_expense = resolve("income_tax_expense");
        row.net_income = resolve("net_income");
        row.eps_basic = resolve("eps_basic");
        row.eps_diluted = resolve("eps_diluted");
        row.shares_basic = resolve("shares_basic");
        row.shares_diluted = resolve("shares_diluted");

        if row.ebitda.is_none() {
            if let (Some(ebit), Some(da)) = (row.ebit, resolve("depreciation_amortization")) {
                row.ebitda = Some(ebit + da);
            }
        }

        if !row.has_data() {
            debug!(
                "No income facts for {} accession={} period={}",
                self.ticker, filing.accession, period_end
            );
            return None;
        }
        Some(row)
    }

    /// Build the balance row for one filing, or `None` if no field resolved.
    ///
    /// Instant context: the period-type argument is irrelevant for the
    /// fact search, only the period end matters.
    #[must_use]
    pub fn build_balance_row(
        &self,
        facts: &FactTable,
        filing: &FilingRecord,
        cutoff: NaiveDate,
    ) -> Option<BalanceRow> {
        let period_end = filing.period_of_report;
        let resolve =
            |field: &str| resolve_field(field, facts, period_end, cutoff, PeriodType::Annual);

        let mut row = BalanceRow::empty(self.meta(filing));
        row.cash_and_equivalents = resolve("cash_and_equivalents");
        row.short_term_investments = resolve("short_term_investments");
        row.accounts_receivable = resolve("accounts_receivable");
        row.inventory = resolve("inventory");
        row.current_assets = resolve("current_assets");
        row.ppe_net = resolve("ppe_net");
        row.goodwill = resolve("goodwill");
        row.intangibles = resolve("intangibles");
        row.total_assets = resolve("total_assets");
        row.accounts_payable = resolve("accounts_payable");
        row.short_term_debt = resolve("short_term_debt");
        row.current_liabilities = resolve("current_liabilities");
        row.long_term_debt = resolve("long_term_debt");
        row.total_liabilities = resolve("total_liabilities");
        row.common_equity = resolve("common_equity");
        row.retained_earnings = resolve("retained_earnings");
        row.total_equity = resolve("total_equity");

        fill_identity_gap(&mut row);

        if !row.has_data() {
            debug!(
                "No balance facts for {} accession={} period={}",
                self.ticker, filing.accession, period_end
            );
            return None;
        }
        Some(row)
    }

    /// Build the cashflow row for one filing, or `None` if no field resolved.
    #[must_use]
    pub fn build_cashflow_row(
        &self,
        facts: &FactTable,
        filing: &FilingRecord,
        cutoff: NaiveDate,
        period_type: PeriodType,
    ) -> Option<CashflowRow> {
        let period_end = filing.period_of_report;
        let resolve = |field: &str| resolve_field(field, facts, period_end, cutoff, period_type);
        // Sign-flipped items come back positive from the mapper for a
        // normally-signed filing; abs() guards against filers that report
        // them positive already.
        let magnitude = |field: &str| resolve(field).map(f64::abs);

        let mut row = CashflowRow::empty(self.meta(filing));
        row.cfo = resolve("cfo");
        row.capex = magnitude("capex");
        row.cfi = resolve("cfi");
        row.cff = resolve("cff");
        row.dividends_paid = magnitude("dividends_paid");
        row.share_repurchases = magnitude("share_repurchases");
        row.net_change_in_cash = resolve("net_change_in_cash");
        row.depreciation_amortization = resolve("depreciation_amortization");
        row.stock_based_compensation = resolve("stock_based_compensation");

        if let (Some(cfo), Some(capex)) = (row.cfo, row.capex) {
            row.free_cash_flow = Some(cfo - capex);
        }

        if !row.has_data() {
            debug!(
                "No cashflow facts for {} accession={} period={}",
                self.ticker, filing.accession, period_end
            );
            return None;
        }
        Some(row)
    }
}

/// Recover a single missing balance-sheet total from the accounting
/// identity `assets = liabilities + equity`. Only fires when exactly one
/// of the three is absent.
fn fill_identity_gap(row: &mut BalanceRow) {
    match (row.total_assets, row.total_liabilities, row.total_equity) {
        (None, Some(liabilities), Some(equity)) => {
            row.total_assets = Some(liabilities + equity);
        }
        (Some(assets), None, Some(equity)) => {
            row.total_liabilities = Some(assets - equity);
        }
        (Some(assets), Some(liabilities), None) => {
            row.total_equity = Some(assets - liabilities);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitfund_core::XbrlFact;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filing() -> FilingRecord {
        FilingRecord {
            cik: "0000320193".to_string(),
            accession: "0000320193-17-000001".to_string(),
            form_type: "10-K".to_string(),
            filing_date: date(2017, 2, 1),
            acceptance_datetime: date(2017, 2, 1).and_hms_opt(16, 30, 0).unwrap(),
            period_of_report: date(2016, 12, 31),
            ticker: Ticker::new("AAPL"),
        }
    }

    fn duration_fact(tag: &str, value: f64) -> XbrlFact {
        XbrlFact {
            tag: tag.to_string(),
            namespace: "us-gaap".to_string(),
            value,
            unit: "USD".to_string(),
            start: Some(date(2016, 1, 1)),
            end: date(2016, 12, 31),
            accession: "0000320193-17-000001".to_string(),
            form: "10-K".to_string(),
            frame: None,
            filed: date(2017, 2, 1),
        }
    }

    fn instant_fact(tag: &str, value: f64) -> XbrlFact {
        XbrlFact {
            start: None,
            ..duration_fact(tag, value)
        }
    }

    fn table(entries: Vec<(&str, XbrlFact)>) -> FactTable {
        let mut facts = FactTable::new();
        for (tag, fact) in entries {
            facts.entry(tag.to_string()).or_default().push(fact);
        }
        facts
    }

    fn parser() -> StatementParser {
        StatementParser::new(Ticker::new("AAPL"), "0000320193".to_string())
    }

    #[test]
    fn test_income_row_basics() {
        let facts = table(vec![
            ("us-gaap:Revenues", duration_fact("Revenues", 1000.0)),
            ("us-gaap:NetIncomeLoss", duration_fact("NetIncomeLoss", 100.0)),
        ]);

        let row = parser()
            .build_income_row(&facts, &filing(), date(2017, 12, 31), PeriodType::Annual)
            .unwrap();
        assert_eq!(row.revenue, Some(1000.0));
        assert_eq!(row.net_income, Some(100.0));
        assert_eq!(row.meta.asof_date, date(2017, 2, 1));
        assert_eq!(row.meta.source, DataSource::Edgar);
    }

    #[test]
    fn test_ebitda_fallback_from_ebit_plus_da() {
        let facts = table(vec![
            (
                "us-gaap:OperatingIncomeLoss",
                duration_fact("OperatingIncomeLoss", 500.0),
            ),
            (
                "us-gaap:DepreciationDepletionAndAmortization",
                duration_fact("DepreciationDepletionAndAmortization", 80.0),
            ),
        ]);

        let row = parser()
            .build_income_row(&facts, &filing(), date(2017, 12, 31), PeriodType::Annual)
            .unwrap();
        assert_eq!(row.ebit, Some(500.0));
        assert_eq!(row.ebitda, Some(580.0));
    }

    #[test]
    fn test_reported_ebitda_not_overwritten() {
        let facts = table(vec![
            (
                "us-gaap:EarningsBeforeInterestTaxesDepreciationAmortization",
                duration_fact("EarningsBeforeInterestTaxesDepreciationAmortization", 700.0),
            ),
            (
                "us-gaap:OperatingIncomeLoss",
                duration_fact("OperatingIncomeLoss", 500.0),
            ),
            (
                "us-gaap:DepreciationDepletionAndAmortization",
                duration_fact("DepreciationDepletionAndAmortization", 80.0),
            ),
        ]);

        let row = parser()
            .build_income_row(&facts, &filing(), date(2017, 12, 31), PeriodType::Annual)
            .unwrap();
        assert_eq!(row.ebitda, Some(700.0));
    }

    #[test]
    fn test_empty_income_row_dropped() {
        let row = parser().build_income_row(
            &FactTable::new(),
            &filing(),
            date(2017, 12, 31),
            PeriodType::Annual,
        );
        assert!(row.is_none());
    }

    #[test]
    fn test_balance_identity_fills_missing_equity() {
        let facts = table(vec![
            ("us-gaap:Assets", instant_fact("Assets", 100.0)),
            ("us-gaap:Liabilities", instant_fact("Liabilities", 80.0)),
        ]);

        let row = parser()
            .build_balance_row(&facts, &filing(), date(2017, 12, 31))
            .unwrap();
        assert_eq!(row.total_equity, Some(20.0));
    }

    #[test]
    fn test_balance_identity_fills_missing_assets() {
        let facts = table(vec![
            ("us-gaap:Liabilities", instant_fact("Liabilities", 80.0)),
            ("us-gaap:StockholdersEquity", instant_fact("StockholdersEquity", 20.0)),
        ]);

        let row = parser()
            .build_balance_row(&facts, &filing(), date(2017, 12, 31))
            .unwrap();
        assert_eq!(row.total_assets, Some(100.0));
    }

    #[test]
    fn test_balance_identity_needs_two_of_three() {
        let facts = table(vec![("us-gaap:Assets", instant_fact("Assets", 100.0))]);

        let row = parser()
            .build_balance_row(&facts, &filing(), date(2017, 12, 31))
            .unwrap();
        assert_eq!(row.total_assets, Some(100.0));
        assert_eq!(row.total_liabilities, None);
        assert_eq!(row.total_equity, None);
    }

    #[test]
    fn test_cashflow_signs_and_fcf() {
        let facts = table(vec![
            (
                "us-gaap:NetCashProvidedByUsedInOperatingActivities",
                duration_fact("NetCashProvidedByUsedInOperatingActivities", 900.0),
            ),
            (
                "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
                duration_fact("PaymentsToAcquirePropertyPlantAndEquipment", -250.0),
            ),
            (
                "us-gaap:PaymentsOfDividends",
                duration_fact("PaymentsOfDividends", -120.0),
            ),
        ]);

        let row = parser()
            .build_cashflow_row(&facts, &filing(), date(2017, 12, 31), PeriodType::Annual)
            .unwrap();
        assert_eq!(row.capex, Some(250.0));
        assert_eq!(row.dividends_paid, Some(120.0));
        assert_eq!(row.free_cash_flow, Some(650.0));
    }

    #[test]
    fn test_cashflow_positive_reported_capex_stays_positive() {
        let facts = table(vec![(
            "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
            duration_fact("PaymentsToAcquirePropertyPlantAndEquipment", 250.0),
        )]);

        let row = parser()
            .build_cashflow_row(&facts, &filing(), date(2017, 12, 31), PeriodType::Annual)
            .unwrap();
        assert_eq!(row.capex, Some(250.0));
    }

    #[test]
    fn test_cutoff_respected_in_resolution() {
        // Fact filed 2017-02-01; a 2016-12-31 cutoff must not see it.
        let facts = table(vec![(
            "us-gaap:Revenues",
            duration_fact("Revenues", 1000.0),
        )]);

        let row = parser().build_income_row(
            &facts,
            &filing(),
            date(2016, 12, 31),
            PeriodType::Annual,
        );
        assert!(row.is_none());
    }
}
