//! Retry policy with exponential backoff for EDGAR requests.
//!
//! The `backoff` crate supplies the wait schedule; the attempt loop here
//! enforces a fixed attempt count and the transient/fatal classification:
//! connection errors, timeouts, and HTTP {429, 500, 502, 503, 504} retry,
//! every other failure is surfaced immediately.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use pitfund_core::{EngineError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// HTTP status codes that warrant a retry.
pub const RETRYABLE_STATUS: &[u16] = &[429, 500, 502, 503, 504];

/// One request failure, classified for the retry loop.
#[derive(Debug)]
pub(crate) enum RequestFailure {
    /// Worth retrying: connection error, timeout, or retryable status.
    Transient {
        /// HTTP status, when the failure was a status code.
        status: Option<u16>,
        detail: String,
    },
    /// Not worth retrying; surfaced to the caller as-is.
    Fatal(EngineError),
}

/// Retry configuration: attempt count and backoff bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub min_wait: Duration,
    /// Ceiling on the wait between retries.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Run `op` up to `max_attempts` times, sleeping on the exponential
    /// schedule between transient failures.
    ///
    /// Exhausting retries on HTTP 429 yields [`EngineError::RateLimit`];
    /// exhausting on any other transient failure yields
    /// [`EngineError::Network`].
    pub(crate) async fn run<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestFailure>>,
    {
        let mut schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.min_wait)
            .with_max_interval(self.max_wait)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();

        let mut last_status: Option<u16> = None;
        let mut last_detail = String::new();

        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(RequestFailure::Fatal(err)) => return Err(err),
                Err(RequestFailure::Transient { status, detail }) => {
                    last_status = status;
                    last_detail = detail;
                    if attempt < self.max_attempts {
                        let wait = schedule.next_backoff().unwrap_or(self.max_wait);
                        warn!(
                            url,
                            attempt,
                            status = ?last_status,
                            "Transient failure, retrying in {:.1}s: {}",
                            wait.as_secs_f64(),
                            last_detail
                        );
                        sleep(wait).await;
                    }
                }
            }
        }

        if last_status == Some(429) {
            Err(EngineError::RateLimit {
                attempts: self.max_attempts,
                url: url.to_string(),
            })
        } else {
            Err(EngineError::Network(format!(
                "{url} failed after {} attempts: {last_detail}",
                self.max_attempts
            )))
        }
    }
}

/// Whether an HTTP status code is transient.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS.contains(&status)
}
