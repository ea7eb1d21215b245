//! XBRL companyfacts fetcher and fact normalization.
//!
//! The companyfacts endpoint returns every historical XBRL fact for a
//! company in one JSON blob. This module flattens the allowlisted
//! namespaces into per-tag fact lists keyed `{namespace}:{tag}`.
//! Malformed entries are skipped with debug logging; a malformed blob
//! fails the ticker with [`EngineError::XbrlParse`].

use crate::client::EdgarClient;
use crate::urls::company_facts_url;
use pitfund_core::dates::parse_date;
use pitfund_core::{EngineError, FactTable, Result, XbrlFact};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// XBRL namespaces the engine reads. Everything else is ignored.
pub const GAAP_NAMESPACES: &[&str] = &["us-gaap", "ifrs-full", "dei"];

#[derive(Debug, Deserialize)]
struct CompanyFactsResponse {
    #[serde(default)]
    facts: HashMap<String, HashMap<String, TagFacts>>,
}

#[derive(Debug, Deserialize)]
struct TagFacts {
    #[serde(default)]
    units: Option<HashMap<String, Vec<RawFact>>>,
}

#[derive(Debug, Deserialize)]
struct RawFact {
    #[serde(default)]
    val: Option<serde_json::Value>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    filed: Option<String>,
    #[serde(default)]
    accn: Option<String>,
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    frame: Option<String>,
}

/// Fetches and normalizes the companyfacts blob for one company.
#[derive(Debug)]
pub struct XbrlFetcher {
    client: Arc<EdgarClient>,
}

impl XbrlFetcher {
    /// Create a fetcher on top of a configured client.
    #[must_use]
    pub const fn new(client: Arc<EdgarClient>) -> Self {
        Self { client }
    }

    /// Fetch and parse all facts for a CIK.
    ///
    /// # Errors
    /// [`EngineError::XbrlParse`] when the blob does not match the
    /// companyfacts shape; HTTP errors from the fetch.
    pub async fn fetch_all_facts(&self, cik: &str) -> Result<FactTable> {
        let url = company_facts_url(cik);
        let raw = self.client.get_json(&url, None).await?;

        let response: CompanyFactsResponse =
            serde_json::from_value(raw).map_err(|e| EngineError::XbrlParse {
                cik: cik.to_string(),
                detail: e.to_string(),
            })?;

        let mut table = FactTable::new();
        for namespace in GAAP_NAMESPACES {
            let Some(tags) = response.facts.get(*namespace) else {
                continue;
            };
            for (tag, tag_facts) in tags {
                let Some(units) = &tag_facts.units else {
                    continue;
                };
                let key = format!("{namespace}:{tag}");
                for (unit, entries) in units {
                    let parsed = parse_entries(tag, namespace, unit, entries);
                    if !parsed.is_empty() {
                        table.entry(key.clone()).or_default().extend(parsed);
                    }
                }
            }
        }

        let total: usize = table.values().map(Vec::len).sum();
        info!(
            "Fetched {} unique tags ({} total facts) for CIK={}",
            table.len(),
            total,
            cik
        );
        Ok(table)
    }
}

/// Parse the fact entries for one tag/unit combination, skipping
/// anything unusable.
fn parse_entries(tag: &str, namespace: &str, unit: &str, entries: &[RawFact]) -> Vec<XbrlFact> {
    let mut facts = Vec::new();

    for entry in entries {
        let Some(value) = entry.val.as_ref().and_then(serde_json::Value::as_f64) else {
            debug!("Skipping fact tag={}: null or non-numeric val", tag);
            continue;
        };
        let Some(end) = entry.end.as_deref().and_then(parse_date) else {
            debug!("Skipping fact tag={}: unparsable end date", tag);
            continue;
        };
        let Some(filed) = entry.filed.as_deref().and_then(parse_date) else {
            debug!("Skipping fact tag={}: unparsable filed date", tag);
            continue;
        };
        let start = entry.start.as_deref().and_then(parse_date);
        if start.is_some_and(|s| end < s) {
            debug!("Skipping fact tag={}: end precedes start", tag);
            continue;
        }

        facts.push(XbrlFact {
            tag: tag.to_string(),
            namespace: namespace.to_string(),
            value,
            unit: unit.to_string(),
            start,
            end,
            accession: entry.accn.clone().unwrap_or_default(),
            form: entry.form.clone().unwrap_or_default(),
            frame: entry.frame.clone().filter(|f| !f.is_empty()),
            filed,
        });
    }

    facts
}
