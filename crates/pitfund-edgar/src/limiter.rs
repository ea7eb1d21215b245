//! Token-bucket rate limiter for SEC EDGAR requests.
//!
//! Every outbound request in the engine acquires one token from a single
//! shared bucket, so concurrent workers back off against the same RPS
//! budget. The bucket refills continuously at the configured rate; burst
//! capacity equals the rate.

use pitfund_core::{EngineError, Result, SEC_MAX_RPS};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Async token-bucket rate limiter.
///
/// Safe to share across tasks behind an `Arc`; acquisition is serialized
/// through a `tokio::sync::Mutex` so refill accounting stays consistent
/// under concurrent callers.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    rate: f64,
    burst: f64,
}

impl TokenBucket {
    /// Create a bucket with `rate` tokens per second and burst equal to
    /// the rate.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the rate is not
    /// positive or exceeds the SEC ceiling of 10 RPS.
    pub fn new(rate: f64) -> Result<Self> {
        if rate <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "rate must be positive, got {rate}"
            )));
        }
        if rate > SEC_MAX_RPS {
            return Err(EngineError::InvalidParameter(format!(
                "SEC EDGAR rate limit is {SEC_MAX_RPS} RPS maximum, got {rate}"
            )));
        }
        Ok(Self {
            state: Mutex::new(BucketState {
                tokens: rate,
                last_refill: Instant::now(),
            }),
            rate,
            burst: rate,
        })
    }

    /// Block until `n` tokens are available, then consume them atomically.
    pub async fn acquire(&self, n: f64) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = self.burst.min(state.tokens + elapsed * self.rate);
                state.last_refill = now;

                if state.tokens >= n {
                    state.tokens -= n;
                    return;
                }
                (n - state.tokens) / self.rate
            };
            sleep(Duration::from_secs_f64(wait)).await;
        }
    }

    /// The configured refill rate in tokens per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_rate_above_ceiling() {
        assert!(TokenBucket::new(10.0).is_ok());
        assert!(TokenBucket::new(10.1).is_err());
        assert!(TokenBucket::new(0.0).is_err());
        assert!(TokenBucket::new(-1.0).is_err());
    }

    #[tokio::test]
    async fn test_burst_is_immediate() {
        let bucket = TokenBucket::new(10.0).unwrap();
        let start = Instant::now();
        for _ in 0..10 {
            bucket.acquire(1.0).await;
        }
        // Full burst should not require any refill wait.
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_blocks_once_bucket_is_drained() {
        let bucket = TokenBucket::new(10.0).unwrap();
        bucket.acquire(10.0).await;

        let start = Instant::now();
        bucket.acquire(1.0).await;
        // One token at 10 RPS takes ~100ms to refill.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_concurrent_acquire() {
        use std::sync::Arc;

        let bucket = Arc::new(TokenBucket::new(10.0).unwrap());
        let mut handles = Vec::new();
        for _ in 0..12 {
            let bucket = Arc::clone(&bucket);
            handles.push(tokio::spawn(async move { bucket.acquire(1.0).await }));
        }
        let start = Instant::now();
        for handle in handles {
            handle.await.unwrap();
        }
        // 12 tokens at 10 RPS with a burst of 10 needs at least ~200ms.
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
