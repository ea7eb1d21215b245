//! Rate-limited, cached HTTP client for SEC EDGAR.
//!
//! Wraps `reqwest` with the pieces EDGAR requires:
//!
//! - `User-Agent` injection (mandated by the SEC, `Name/Version email`)
//! - Token-bucket rate limiting shared across all workers
//! - Retry with exponential backoff on transient failures
//! - Content-addressed response caching (EDGAR history is immutable, so
//!   cached payloads never expire)
//!
//! The underlying `reqwest::Client` is pooled per user-agent string at
//! module level: engines with different configurations in one process
//! reuse connections but never share a session with a different
//! `User-Agent`. The response cache is owned per client.

use crate::limiter::TokenBucket;
use crate::retry::{RequestFailure, RetryPolicy, is_retryable_status};
use once_cell::sync::Lazy;
use pitfund_cache::SqliteResponseCache;
use pitfund_core::{EngineConfig, EngineError, ResponseCache, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Request timeout applied to every EDGAR call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Filename of the on-disk response cache inside the cache directory.
const CACHE_FILE: &str = "edgar_http.sqlite";

// Sessions pooled per user-agent so distinct configs reuse connections but
// never cross-contaminate headers.
static SESSION_POOL: Lazy<Mutex<HashMap<String, reqwest::Client>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn shared_session(user_agent: &str) -> Result<reqwest::Client> {
    let mut pool = SESSION_POOL
        .lock()
        .map_err(|e| EngineError::Other(e.to_string()))?;
    if let Some(client) = pool.get(user_agent) {
        return Ok(client.clone());
    }
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| EngineError::Network(e.to_string()))?;
    debug!("Created new HTTP session for user agent {:?}", user_agent);
    pool.insert(user_agent.to_string(), client.clone());
    Ok(client)
}

/// Deterministic cache key for a request: SHA-256 over the URL and the
/// query parameters in sorted order.
#[must_use]
pub fn request_cache_key(url: &str, params: Option<&[(String, String)]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    if let Some(params) = params {
        let sorted: BTreeMap<&str, &str> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for (key, value) in sorted {
            hasher.update(b"\x1f");
            hasher.update(key.as_bytes());
            hasher.update(b"\x1e");
            hasher.update(value.as_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

/// SEC EDGAR HTTP client with rate limiting, caching, and retry logic.
///
/// Cheap to share behind an `Arc`; all interior state is `Send + Sync`.
#[derive(Clone)]
pub struct EdgarClient {
    session: reqwest::Client,
    limiter: Arc<TokenBucket>,
    cache: Arc<dyn ResponseCache>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl EdgarClient {
    /// Create a client with the on-disk SQLite cache under the config's
    /// cache directory.
    ///
    /// # Errors
    /// Returns an error if the session, limiter, or cache cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let cache = SqliteResponseCache::new(
            config.cache_dir.join(CACHE_FILE),
            config.max_cache_bytes,
        )?;
        Self::with_cache(config, Arc::new(cache))
    }

    /// Create a client with a caller-provided cache backend.
    ///
    /// # Errors
    /// Returns an error if the session or limiter cannot be built.
    pub fn with_cache(config: &EngineConfig, cache: Arc<dyn ResponseCache>) -> Result<Self> {
        Ok(Self {
            session: shared_session(&config.user_agent)?,
            limiter: Arc::new(TokenBucket::new(config.rate_limit_rps)?),
            cache,
            retry: RetryPolicy::default(),
        })
    }

    /// Fetch a JSON endpoint, returning the parsed value.
    ///
    /// Cache hits return without touching the network or the rate
    /// limiter. Misses acquire one token, fetch with retry, and store the
    /// payload.
    ///
    /// # Errors
    /// [`EngineError::RateLimit`] when retries are exhausted on HTTP 429,
    /// [`EngineError::Http`] on non-retryable statuses,
    /// [`EngineError::Network`] on transport failures, and
    /// [`EngineError::Parse`] on invalid JSON.
    pub async fn get_json(
        &self,
        url: &str,
        params: Option<&[(String, String)]>,
    ) -> Result<serde_json::Value> {
        let key = request_cache_key(url, params);
        if let Some(cached) = self.cache.get(&key).await? {
            debug!("Cache hit: {}", url);
            return serde_json::from_slice(&cached).map_err(|e| EngineError::Parse(e.to_string()));
        }

        let body = self.fetch_with_retry(url, params).await?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| EngineError::Parse(e.to_string()))?;
        self.cache.put(&key, &body).await?;
        debug!("Fetched and cached: {}", url);
        Ok(value)
    }

    /// Fetch raw bytes (e.g. filing documents).
    ///
    /// Same cache, rate-limit, and retry behavior as [`Self::get_json`].
    ///
    /// # Errors
    /// See [`Self::get_json`].
    pub async fn get_raw(&self, url: &str) -> Result<Vec<u8>> {
        let key = request_cache_key(url, None);
        if let Some(cached) = self.cache.get(&key).await? {
            debug!("Cache hit (raw): {}", url);
            return Ok(cached);
        }

        let body = self.fetch_with_retry(url, None).await?;
        self.cache.put(&key, &body).await?;
        Ok(body)
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        params: Option<&[(String, String)]>,
    ) -> Result<Vec<u8>> {
        let this = self;
        this.retry
            .run(url, move || async move {
                this.limiter.acquire(1.0).await;

                let mut request = this.session.get(url);
                if let Some(params) = params {
                    request = request.query(params);
                }

                let response = match request.send().await {
                    Ok(response) => response,
                    Err(err) if err.is_connect() || err.is_timeout() => {
                        return Err(RequestFailure::Transient {
                            status: None,
                            detail: err.to_string(),
                        });
                    }
                    Err(err) => {
                        return Err(RequestFailure::Fatal(EngineError::Network(err.to_string())));
                    }
                };

                let status = response.status().as_u16();
                if is_retryable_status(status) {
                    return Err(RequestFailure::Transient {
                        status: Some(status),
                        detail: format!("HTTP {status}"),
                    });
                }
                if !response.status().is_success() {
                    return Err(RequestFailure::Fatal(EngineError::Http {
                        status,
                        url: url.to_string(),
                    }));
                }

                match response.bytes().await {
                    Ok(bytes) => Ok(bytes.to_vec()),
                    Err(err) => Err(RequestFailure::Transient {
                        status: None,
                        detail: err.to_string(),
                    }),
                }
            })
            .await
    }

    /// The response cache backing this client.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitfund_cache::InMemoryResponseCache;

    fn config() -> EngineConfig {
        EngineConfig::new("Test/1.0 test@example.com").unwrap()
    }

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = request_cache_key("https://data.sec.gov/x.json", None);
        let b = request_cache_key("https://data.sec.gov/x.json", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_cache_key_param_order_insensitive() {
        let p1 = vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        let p2 = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        assert_eq!(
            request_cache_key("https://data.sec.gov/x.json", Some(&p1)),
            request_cache_key("https://data.sec.gov/x.json", Some(&p2)),
        );
    }

    #[test]
    fn test_cache_key_distinguishes_urls_and_params() {
        let p = vec![("a".to_string(), "1".to_string())];
        let plain = request_cache_key("https://data.sec.gov/x.json", None);
        let with_params = request_cache_key("https://data.sec.gov/x.json", Some(&p));
        let other_url = request_cache_key("https://data.sec.gov/y.json", None);
        assert_ne!(plain, with_params);
        assert_ne!(plain, other_url);
    }

    #[tokio::test]
    async fn test_cached_payload_skips_network() {
        // Seed the cache under the exact key get_json computes; the URL
        // resolves nowhere, so a hit is the only way this can succeed.
        let cache = Arc::new(InMemoryResponseCache::default());
        let url = "http://127.0.0.1:1/submissions.json";
        let key = request_cache_key(url, None);
        cache.put(&key, br#"{"ok": true}"#).await.unwrap();

        let client = EdgarClient::with_cache(&config(), cache).unwrap();
        let value = client.get_json(url, None).await.unwrap();
        assert_eq!(value["ok"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_session_pool_reuses_entries() {
        shared_session("Pool/1.0 a@example.com").unwrap();
        shared_session("Pool/1.0 a@example.com").unwrap();
        shared_session("Other/1.0 b@example.com").unwrap();

        let pool = SESSION_POOL.lock().unwrap();
        assert!(pool.contains_key("Pool/1.0 a@example.com"));
        assert!(pool.contains_key("Other/1.0 b@example.com"));
    }
}
