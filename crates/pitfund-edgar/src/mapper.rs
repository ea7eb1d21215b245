//! Maps XBRL GAAP tags to standardized field names.
//!
//! The mapping is intentionally verbose and explicit: each standardized
//! field lists its acceptable GAAP tags in priority order, with a sign
//! flip where filings report the item as a negative (capex, dividends,
//! buybacks). To extend coverage, add tag variants to [`TAG_PRIORITY_MAP`].

use crate::contexts::{best_fact_for_period, filter_by_period_type};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use pitfund_core::{ContextType, FactTable, PeriodType, TagMapping};
use std::collections::HashMap;

/// The static tag priority table, ordered by business meaning.
///
/// Immutable; initialized once at startup. The reverse indexes below are
/// pure functions of this value.
pub static TAG_PRIORITY_MAP: &[TagMapping] = &[
    // Income statement
    TagMapping {
        standard_field: "revenue",
        tags: &[
            "us-gaap:Revenues",
            "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax",
            "us-gaap:RevenueFromContractWithCustomerIncludingAssessedTax",
            "us-gaap:SalesRevenueNet",
            "us-gaap:SalesRevenueGoodsNet",
            "us-gaap:RevenuesNetOfInterestExpense",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "cost_of_revenue",
        tags: &[
            "us-gaap:CostOfRevenue",
            "us-gaap:CostOfGoodsAndServicesSold",
            "us-gaap:CostOfGoodsSold",
            "us-gaap:CostOfServices",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "gross_profit",
        tags: &["us-gaap:GrossProfit"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "operating_expenses",
        tags: &["us-gaap:OperatingExpenses", "us-gaap:OperatingCostsAndExpenses"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "ebit",
        tags: &[
            "us-gaap:OperatingIncomeLoss",
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "ebitda",
        tags: &[
            "us-gaap:EarningsBeforeInterestTaxesDepreciationAmortization",
            "us-gaap:EBITDA",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "interest_expense",
        tags: &[
            "us-gaap:InterestExpense",
            "us-gaap:InterestAndDebtExpense",
            "us-gaap:InterestExpenseDebt",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "pretax_income",
        tags: &[
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "income_tax_expense",
        tags: &["us-gaap:IncomeTaxExpenseBenefit"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "net_income",
        tags: &[
            "us-gaap:NetIncomeLoss",
            "us-gaap:ProfitLoss",
            "us-gaap:NetIncomeLossAvailableToCommonStockholdersBasic",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "eps_basic",
        tags: &["us-gaap:EarningsPerShareBasic"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "eps_diluted",
        tags: &["us-gaap:EarningsPerShareDiluted"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "shares_basic",
        tags: &["us-gaap:WeightedAverageNumberOfSharesOutstandingBasic"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "shares_diluted",
        tags: &["us-gaap:WeightedAverageNumberOfDilutedSharesOutstanding"],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    // Balance sheet
    TagMapping {
        standard_field: "cash_and_equivalents",
        tags: &[
            "us-gaap:CashAndCashEquivalentsAtCarryingValue",
            "us-gaap:Cash",
            "us-gaap:CashCashEquivalentsAndShortTermInvestments",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "short_term_investments",
        tags: &["us-gaap:ShortTermInvestments", "us-gaap:MarketableSecuritiesCurrent"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "accounts_receivable",
        tags: &[
            "us-gaap:AccountsReceivableNetCurrent",
            "us-gaap:ReceivablesNetCurrent",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "inventory",
        tags: &["us-gaap:InventoryNet", "us-gaap:Inventories"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "current_assets",
        tags: &["us-gaap:AssetsCurrent"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "ppe_net",
        tags: &[
            "us-gaap:PropertyPlantAndEquipmentNet",
            "us-gaap:PropertyPlantAndEquipmentAndFinanceLeaseRightOfUseAssetAfterAccumulatedDepreciationAndAmortization",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "goodwill",
        tags: &["us-gaap:Goodwill"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "intangibles",
        tags: &[
            "us-gaap:IntangibleAssetsNetExcludingGoodwill",
            "us-gaap:FiniteLivedIntangibleAssetsNet",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "total_assets",
        tags: &["us-gaap:Assets"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "accounts_payable",
        tags: &[
            "us-gaap:AccountsPayableCurrent",
            "us-gaap:AccountsPayableAndAccruedLiabilitiesCurrent",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "short_term_debt",
        tags: &[
            "us-gaap:LongTermDebtCurrent",
            "us-gaap:ShortTermBorrowings",
            "us-gaap:DebtCurrent",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "current_liabilities",
        tags: &["us-gaap:LiabilitiesCurrent"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "long_term_debt",
        tags: &[
            "us-gaap:LongTermDebtNoncurrent",
            "us-gaap:LongTermDebt",
            "us-gaap:LongTermDebtAndCapitalLeaseObligations",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "total_liabilities",
        tags: &["us-gaap:Liabilities"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "common_equity",
        tags: &["us-gaap:StockholdersEquity", "us-gaap:CommonStockholdersEquity"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "retained_earnings",
        tags: &["us-gaap:RetainedEarningsAccumulatedDeficit"],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    TagMapping {
        standard_field: "total_equity",
        tags: &[
            "us-gaap:StockholdersEquity",
            "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
        ],
        sign_flip: false,
        context_type: ContextType::Instant,
    },
    // Cash flow statement
    TagMapping {
        standard_field: "cfo",
        tags: &[
            "us-gaap:NetCashProvidedByUsedInOperatingActivities",
            "us-gaap:NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "capex",
        tags: &[
            "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
            "us-gaap:PaymentsForCapitalImprovements",
            "us-gaap:CapitalExpendituresIncurredButNotYetPaid",
        ],
        sign_flip: true,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "cfi",
        tags: &[
            "us-gaap:NetCashProvidedByUsedInInvestingActivities",
            "us-gaap:NetCashProvidedByUsedInInvestingActivitiesContinuingOperations",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "cff",
        tags: &[
            "us-gaap:NetCashProvidedByUsedInFinancingActivities",
            "us-gaap:NetCashProvidedByUsedInFinancingActivitiesContinuingOperations",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "dividends_paid",
        tags: &["us-gaap:PaymentsOfDividends", "us-gaap:PaymentsOfDividendsCommonStock"],
        sign_flip: true,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "share_repurchases",
        tags: &["us-gaap:PaymentsForRepurchaseOfCommonStock"],
        sign_flip: true,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "net_change_in_cash",
        tags: &[
            "us-gaap:CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalentsPeriodIncreaseDecreaseIncludingExchangeRateEffect",
            "us-gaap:CashAndCashEquivalentsPeriodIncreaseDecrease",
            "us-gaap:NetCashProvidedByUsedInContinuingOperations",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "depreciation_amortization",
        tags: &[
            "us-gaap:DepreciationDepletionAndAmortization",
            "us-gaap:DepreciationAndAmortization",
            "us-gaap:Depreciation",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
    TagMapping {
        standard_field: "stock_based_compensation",
        tags: &[
            "us-gaap:ShareBasedCompensation",
            "us-gaap:AllocatedShareBasedCompensationExpense",
        ],
        sign_flip: false,
        context_type: ContextType::Duration,
    },
];

/// Lookup index: standard field name to its mapping row.
pub static FIELD_TO_MAPPING: Lazy<HashMap<&'static str, &'static TagMapping>> =
    Lazy::new(|| {
        TAG_PRIORITY_MAP
            .iter()
            .map(|mapping| (mapping.standard_field, mapping))
            .collect()
    });

/// Reverse index: XBRL tag to `(field, sign_flip, context_type)`.
///
/// Only the first (highest-priority) occurrence of a tag registers.
pub static TAG_TO_FIELD: Lazy<HashMap<&'static str, (&'static str, bool, ContextType)>> =
    Lazy::new(|| {
        let mut index = HashMap::new();
        for mapping in TAG_PRIORITY_MAP {
            for tag in mapping.tags {
                index
                    .entry(*tag)
                    .or_insert((mapping.standard_field, mapping.sign_flip, mapping.context_type));
            }
        }
        index
    });

/// Resolve one standardized field against a company's fact table.
///
/// Walks the field's tags in priority order; for each tag, applies the
/// period-type filter and best-fact selection, returning the first hit
/// with the mapping's sign applied. `None` when no tag yields a fact.
#[must_use]
pub fn resolve_field(
    field: &str,
    facts: &FactTable,
    period_end: NaiveDate,
    cutoff: NaiveDate,
    period_type: PeriodType,
) -> Option<f64> {
    let mapping = FIELD_TO_MAPPING.get(field)?;

    for tag in mapping.tags {
        let Some(candidates) = facts.get(*tag) else {
            continue;
        };
        let filtered = filter_by_period_type(candidates, mapping.context_type, period_type);
        if let Some(best) = best_fact_for_period(&filtered, period_end, cutoff) {
            let sign = if mapping.sign_flip { -1.0 } else { 1.0 };
            return Some(best.value * sign);
        }
    }
    None
}

/// Standard fields belonging to one statement, in schema order.
#[must_use]
pub fn fields_for(context_type: ContextType) -> Vec<&'static str> {
    TAG_PRIORITY_MAP
        .iter()
        .filter(|m| m.context_type == context_type)
        .map(|m| m.standard_field)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitfund_core::XbrlFact;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fact(tag: &str, value: f64, start: Option<NaiveDate>, end: NaiveDate) -> XbrlFact {
        XbrlFact {
            tag: tag.split(':').nth(1).unwrap_or(tag).to_string(),
            namespace: "us-gaap".to_string(),
            value,
            unit: "USD".to_string(),
            start,
            end,
            accession: "0000320193-17-000001".to_string(),
            form: "10-K".to_string(),
            frame: None,
            filed: date(2017, 2, 1),
        }
    }

    fn table(entries: &[(&str, XbrlFact)]) -> FactTable {
        let mut facts = FactTable::new();
        for (tag, fact) in entries {
            facts.entry((*tag).to_string()).or_default().push(fact.clone());
        }
        facts
    }

    #[test]
    fn test_priority_order_first_tag_wins() {
        let facts = table(&[
            (
                "us-gaap:Revenues",
                fact(
                    "us-gaap:Revenues",
                    100.0,
                    Some(date(2016, 1, 1)),
                    date(2016, 12, 31),
                ),
            ),
            (
                "us-gaap:SalesRevenueNet",
                fact(
                    "us-gaap:SalesRevenueNet",
                    999.0,
                    Some(date(2016, 1, 1)),
                    date(2016, 12, 31),
                ),
            ),
        ]);

        let value = resolve_field(
            "revenue",
            &facts,
            date(2016, 12, 31),
            date(2017, 12, 31),
            PeriodType::Annual,
        );
        assert_eq!(value, Some(100.0));
    }

    #[test]
    fn test_fallback_tag_used_when_primary_missing() {
        let facts = table(&[(
            "us-gaap:SalesRevenueNet",
            fact(
                "us-gaap:SalesRevenueNet",
                999.0,
                Some(date(2016, 1, 1)),
                date(2016, 12, 31),
            ),
        )]);

        let value = resolve_field(
            "revenue",
            &facts,
            date(2016, 12, 31),
            date(2017, 12, 31),
            PeriodType::Annual,
        );
        assert_eq!(value, Some(999.0));
    }

    #[test]
    fn test_capex_sign_flip() {
        let facts = table(&[(
            "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
            fact(
                "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
                -12_000.0,
                Some(date(2016, 1, 1)),
                date(2016, 12, 31),
            ),
        )]);

        let value = resolve_field(
            "capex",
            &facts,
            date(2016, 12, 31),
            date(2017, 12, 31),
            PeriodType::Annual,
        );
        assert_eq!(value, Some(12_000.0));
    }

    #[test]
    fn test_instant_field_ignores_duration_facts() {
        let facts = table(&[(
            "us-gaap:Assets",
            fact(
                "us-gaap:Assets",
                500.0,
                Some(date(2016, 1, 1)),
                date(2016, 12, 31),
            ),
        )]);

        let value = resolve_field(
            "total_assets",
            &facts,
            date(2016, 12, 31),
            date(2017, 12, 31),
            PeriodType::Annual,
        );
        assert_eq!(value, None);
    }

    #[test]
    fn test_unknown_field_is_none() {
        assert_eq!(
            resolve_field(
                "no_such_field",
                &FactTable::new(),
                date(2016, 12, 31),
                date(2017, 12, 31),
                PeriodType::Annual,
            ),
            None
        );
    }

    #[test]
    fn test_mapping_table_shape() {
        assert!(FIELD_TO_MAPPING.contains_key("revenue"));
        assert!(FIELD_TO_MAPPING["capex"].sign_flip);
        assert!(FIELD_TO_MAPPING["dividends_paid"].sign_flip);
        assert!(FIELD_TO_MAPPING["share_repurchases"].sign_flip);
        assert!(!FIELD_TO_MAPPING["revenue"].sign_flip);
        assert_eq!(
            FIELD_TO_MAPPING["total_assets"].context_type,
            ContextType::Instant
        );
        assert_eq!(FIELD_TO_MAPPING["cfo"].context_type, ContextType::Duration);
    }

    #[test]
    fn test_reverse_index_first_occurrence_wins() {
        let (field, sign_flip, context) = TAG_TO_FIELD["us-gaap:Revenues"];
        assert_eq!(field, "revenue");
        assert!(!sign_flip);
        assert_eq!(context, ContextType::Duration);

        // StockholdersEquity appears under both common_equity and
        // total_equity; the earlier row registers.
        let (field, _, _) = TAG_TO_FIELD["us-gaap:StockholdersEquity"];
        assert_eq!(field, "common_equity");
    }

    #[test]
    fn test_fields_partition_by_context() {
        let duration = fields_for(ContextType::Duration);
        let instant = fields_for(ContextType::Instant);
        assert!(duration.contains(&"revenue"));
        assert!(duration.contains(&"cfo"));
        assert!(instant.contains(&"total_assets"));
        assert!(!instant.contains(&"revenue"));
    }
}
