//! Ticker to CIK resolution using the SEC company tickers registry.
//!
//! The registry (~1.5 MB JSON) is bulk-downloaded once per resolver and
//! normalized into an uppercase ticker map. The raw payload is cached on
//! disk by [`EdgarClient`] automatically, so repeated builds do not re-hit
//! the network.

use crate::client::EdgarClient;
use crate::urls::TICKER_REGISTRY_URL;
use pitfund_core::{EngineError, Result, Ticker};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// One normalized registry entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CikEntry {
    /// Zero-padded 10-digit CIK string.
    pub cik: String,
    /// SEC-registered company name.
    pub company_name: String,
}

#[derive(Debug, Deserialize)]
struct RawRegistryEntry {
    cik_str: u64,
    ticker: String,
    #[serde(default)]
    title: String,
}

/// Resolves equity tickers to SEC CIK numbers.
///
/// Loading is lazy and idempotent: the first lookup downloads and parses
/// the registry, later lookups reuse the in-memory map. After loading the
/// map is read-only and safe to share across workers.
#[derive(Debug)]
pub struct CikResolver {
    client: Arc<EdgarClient>,
    map: OnceCell<HashMap<String, CikEntry>>,
}

impl CikResolver {
    /// Create a resolver on top of a configured client.
    #[must_use]
    pub fn new(client: Arc<EdgarClient>) -> Self {
        Self {
            client,
            map: OnceCell::new(),
        }
    }

    /// Download and normalize the registry if not already loaded.
    ///
    /// # Errors
    /// Propagates HTTP and parse failures from the registry download.
    pub async fn load(&self) -> Result<&HashMap<String, CikEntry>> {
        self.map
            .get_or_try_init(|| async {
                let raw = self.client.get_json(TICKER_REGISTRY_URL, None).await?;
                let map = parse_registry(raw)?;
                info!("CIK map loaded: {} entries", map.len());
                Ok(map)
            })
            .await
    }

    /// Resolve a ticker to its registry entry.
    ///
    /// # Errors
    /// Returns [`EngineError::CikLookup`] for unknown tickers.
    pub async fn resolve(&self, ticker: &Ticker) -> Result<CikEntry> {
        let map = self.load().await?;
        map.get(ticker.as_str())
            .cloned()
            .ok_or_else(|| EngineError::CikLookup(ticker.to_string()))
    }

    /// Resolve multiple tickers, preserving input order.
    ///
    /// Unresolved tickers are skipped with a warning instead of failing
    /// the batch.
    ///
    /// # Errors
    /// Propagates registry download failures only.
    pub async fn resolve_many(&self, tickers: &[Ticker]) -> Result<Vec<(Ticker, CikEntry)>> {
        let map = self.load().await?;
        let mut resolved = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            match map.get(ticker.as_str()) {
                Some(entry) => resolved.push((ticker.clone(), entry.clone())),
                None => {
                    warn!("Could not resolve ticker '{}' to CIK, skipping", ticker);
                }
            }
        }
        Ok(resolved)
    }

    /// The SEC-registered company name for a ticker, if known.
    pub async fn company_name(&self, ticker: &Ticker) -> Result<Option<String>> {
        let map = self.load().await?;
        Ok(map.get(ticker.as_str()).map(|e| e.company_name.clone()))
    }
}

/// Normalize the raw registry JSON (integer-indexed object of
/// `{cik_str, ticker, title}` entries) into an uppercase ticker map.
fn parse_registry(raw: serde_json::Value) -> Result<HashMap<String, CikEntry>> {
    let entries: HashMap<String, RawRegistryEntry> =
        serde_json::from_value(raw).map_err(|e| EngineError::Parse(e.to_string()))?;

    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries.into_values() {
        let ticker = entry.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        map.insert(
            ticker,
            CikEntry {
                cik: format!("{:010}", entry.cik_str),
                company_name: entry.title.trim().to_string(),
            },
        );
    }
    Ok(map)
}
