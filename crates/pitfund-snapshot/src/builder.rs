//! Top-level snapshot orchestration.
//!
//! [`SnapshotEngine::build`] runs the whole pipeline: resolve tickers to
//! CIKs, fan tickers out to a worker pool, and for each ticker fetch the
//! PIT-gated filings, select one per period, pull the XBRL facts, and
//! build standardized rows. Workers hand their output to a single
//! merging consumer over a channel; merging happens in request order so
//! runs are reproducible regardless of completion order.
//!
//! Failure scope is per ticker: a ticker that cannot be processed is
//! logged and lands in the coverage report's missing list. The one
//! exception is a cutoff violation, which aborts the build.

use crate::assemble::{
    CompanyRow, balance_frame, cashflow_frame, company_master_frame, filings_frame, income_frame,
};
use crate::coverage::build_coverage_report;
use crate::derived::{derived_frame, derived_rows};
use crate::validate::{assert_valid_table, check_balance_identity, check_cashflow_reconciliation};
use pitfund_core::schema::{
    BALANCE_SCHEMA, CASHFLOW_SCHEMA, COMPANY_MASTER_SCHEMA, DERIVED_SCHEMA, FILINGS_SCHEMA,
    INCOME_SCHEMA,
};
use pitfund_core::{
    BalanceRow, CashflowRow, EngineConfig, EngineError, FilingRecord, IncomeRow, ResolvedConfig,
    Result, SnapshotRequest, SnapshotResult, SnapshotTables, Ticker,
};
use pitfund_edgar::{
    CikEntry, CikResolver, EdgarClient, FilingSelector, FilingsIndex, StatementParser, XbrlFetcher,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything one worker produces for one ticker.
#[derive(Debug, Default)]
struct TickerOutput {
    filings: Vec<FilingRecord>,
    income: Vec<IncomeRow>,
    balance: Vec<BalanceRow>,
    cashflow: Vec<CashflowRow>,
}

/// Builds point-in-time fundamental snapshots from SEC EDGAR.
#[derive(Debug)]
pub struct SnapshotEngine {
    config: EngineConfig,
    client: Arc<EdgarClient>,
}

impl SnapshotEngine {
    /// Create an engine with the default on-disk response cache.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or cache cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let client = Arc::new(EdgarClient::new(&config)?);
        Ok(Self { config, client })
    }

    /// Create an engine around an existing client (custom cache, tests).
    #[must_use]
    pub fn with_client(config: EngineConfig, client: Arc<EdgarClient>) -> Self {
        Self { config, client }
    }

    /// Build a snapshot for the request.
    ///
    /// # Errors
    /// Fatal errors only: PIT-unsafe configuration, registry download
    /// failure, cutoff violations, or schema violations when validation
    /// is enabled. Per-ticker failures surface in the coverage report.
    pub async fn build(&self, request: &SnapshotRequest) -> Result<SnapshotResult> {
        self.build_with_cancel(request, CancellationToken::new()).await
    }

    /// Build a snapshot, stopping early when `cancel` fires.
    ///
    /// In-flight requests finish; no worker starts new work after the
    /// signal. Partial results are returned and the coverage report
    /// reflects what actually completed.
    ///
    /// # Errors
    /// See [`Self::build`].
    pub async fn build_with_cancel(
        &self,
        request: &SnapshotRequest,
        cancel: CancellationToken,
    ) -> Result<SnapshotResult> {
        let resolved = ResolvedConfig::resolve(request, &self.config);
        resolved.assert_pit_safe()?;

        let tickers = dedupe_tickers(&request.tickers);
        let resolver = CikResolver::new(Arc::clone(&self.client));
        let resolved_ciks = resolver.resolve_many(&tickers).await?;
        info!(
            "Resolved {}/{} tickers to CIKs",
            resolved_ciks.len(),
            tickers.len()
        );

        let company_rows: Vec<CompanyRow> = resolved_ciks
            .iter()
            .map(|(ticker, entry)| CompanyRow {
                ticker: ticker.clone(),
                cik: entry.cik.clone(),
                company_name: entry.company_name.clone(),
                sic: None,
                exchange: None,
            })
            .collect();

        let outputs = self
            .run_workers(request, &resolved, &resolved_ciks, &cancel)
            .await?;

        self.assemble(request, &tickers, company_rows, outputs)
    }

    /// Fan tickers out to the worker pool and collect their outputs.
    async fn run_workers(
        &self,
        request: &SnapshotRequest,
        resolved: &ResolvedConfig,
        resolved_ciks: &[(Ticker, CikEntry)],
        cancel: &CancellationToken,
    ) -> Result<HashMap<Ticker, TickerOutput>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let (tx, mut rx) = mpsc::channel(resolved_ciks.len().max(1));

        for (ticker, entry) in resolved_ciks {
            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let cancel = cancel.clone();
            let ticker = ticker.clone();
            let cik = entry.cik.clone();
            let cutoff = request.cutoff_date;
            let period_type = request.period_type;
            let allow_amendments = resolved.allow_amendments;

            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let outcome = if cancel.is_cancelled() {
                    Ok(None)
                } else {
                    run_ticker(
                        client,
                        ticker.clone(),
                        cik,
                        cutoff,
                        period_type,
                        allow_amendments,
                        cancel,
                    )
                    .await
                    .map(Some)
                };
                // The receiver only drops on early return; nothing to do
                // if the send fails.
                let _ = tx.send((ticker, outcome)).await;
            });
        }
        drop(tx);

        let mut outputs = HashMap::new();
        while let Some((ticker, outcome)) = rx.recv().await {
            match outcome {
                Ok(Some(output)) => {
                    outputs.insert(ticker, output);
                }
                Ok(None) => {
                    info!("Skipped {} after cancellation", ticker);
                }
                Err(err @ EngineError::CutoffViolation { .. }) => {
                    return Err(err);
                }
                Err(err) => {
                    warn!("Error processing ticker {}: {}", ticker, err);
                }
            }
        }
        Ok(outputs)
    }

    /// Merge worker outputs in request order and build the final tables.
    fn assemble(
        &self,
        request: &SnapshotRequest,
        tickers: &[Ticker],
        company_rows: Vec<CompanyRow>,
        mut outputs: HashMap<Ticker, TickerOutput>,
    ) -> Result<SnapshotResult> {
        let mut all_filings = Vec::new();
        let mut all_income = Vec::new();
        let mut all_balance = Vec::new();
        let mut all_cashflow = Vec::new();
        let mut filing_counts = HashMap::new();

        for ticker in tickers {
            let Some(output) = outputs.remove(ticker) else {
                continue;
            };
            filing_counts.insert(ticker.clone(), output.filings.len());
            all_filings.extend(output.filings);
            all_income.extend(output.income);
            all_balance.extend(output.balance);
            all_cashflow.extend(output.cashflow);
        }

        let company_master = company_master_frame(&company_rows)?;
        let filings = filings_frame(&all_filings)?;
        let income = income_frame(&all_income)?;
        let balance = check_balance_identity(balance_frame(&all_balance)?)?;
        let cashflow = check_cashflow_reconciliation(cashflow_frame(&all_cashflow)?)?;
        let derived = derived_frame(&derived_rows(&all_income, &all_balance))?;

        let validations = [
            (&company_master, &COMPANY_MASTER_SCHEMA),
            (&filings, &FILINGS_SCHEMA),
            (&income, &INCOME_SCHEMA),
            (&balance, &BALANCE_SCHEMA),
            (&cashflow, &CASHFLOW_SCHEMA),
            (&derived, &DERIVED_SCHEMA),
        ];
        for (df, schema) in validations {
            match assert_valid_table(df, schema) {
                Ok(()) => {}
                Err(err) if self.config.validate => return Err(err),
                Err(err) => warn!("Validation warning: {}", err),
            }
        }

        let coverage = build_coverage_report(
            tickers,
            &income,
            &balance,
            &cashflow,
            filing_counts,
        )?;

        Ok(SnapshotResult {
            cutoff: request.cutoff_date,
            tables: SnapshotTables {
                company_master,
                filings,
                statements_income: income,
                statements_balance: balance,
                statements_cashflow: cashflow,
                derived_metrics: derived,
            },
            coverage,
        })
    }
}

/// One ticker's pipeline: filings index, selection, facts, rows.
async fn run_ticker(
    client: Arc<EdgarClient>,
    ticker: Ticker,
    cik: String,
    cutoff: chrono::NaiveDate,
    period_type: pitfund_core::PeriodType,
    allow_amendments: bool,
    cancel: CancellationToken,
) -> Result<TickerOutput> {
    info!("Processing ticker={} cik={}", ticker, cik);

    let index = FilingsIndex::new(Arc::clone(&client), allow_amendments);
    let filings = index
        .fetch_filings(&cik, &ticker, cutoff, period_type.into())
        .await?;
    let selected = FilingSelector::new(allow_amendments).select(&filings, cutoff)?;

    if cancel.is_cancelled() {
        return Ok(TickerOutput {
            filings: selected,
            ..TickerOutput::default()
        });
    }

    let facts = XbrlFetcher::new(client).fetch_all_facts(&cik).await?;
    let parser = StatementParser::new(ticker, cik);

    let mut output = TickerOutput {
        filings: selected,
        ..TickerOutput::default()
    };
    for filing in &output.filings {
        if let Some(row) = parser.build_income_row(&facts, filing, cutoff, period_type) {
            output.income.push(row);
        }
        if let Some(row) = parser.build_balance_row(&facts, filing, cutoff) {
            output.balance.push(row);
        }
        if let Some(row) = parser.build_cashflow_row(&facts, filing, cutoff, period_type) {
            output.cashflow.push(row);
        }
    }
    Ok(output)
}

/// Drop duplicate request tickers, keeping first occurrence order.
fn dedupe_tickers(tickers: &[Ticker]) -> Vec<Ticker> {
    let mut seen = std::collections::HashSet::new();
    tickers
        .iter()
        .filter(|t| seen.insert(t.as_str().to_string()))
        .cloned()
        .collect()
}
