//! Cache trait for HTTP response bodies.
//!
//! The response cache is the only long-lived mutable state in the engine.
//! Keys are content-addressed (SHA-256 of the canonical request), values
//! are opaque byte payloads. EDGAR historical data is immutable, so
//! entries never expire; implementations enforce a size cap instead.

use crate::error::Result;
use async_trait::async_trait;

/// Trait for caching HTTP response payloads across snapshot builds.
///
/// Implementations must be safe for concurrent use: multiple workers read
/// and write the cache simultaneously.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the cached payload for a key, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a payload under a key, evicting old entries if the size cap
    /// would be exceeded.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Whether a key is present.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Total bytes currently stored.
    async fn size_bytes(&self) -> Result<u64>;

    /// Removes all entries.
    async fn clear(&self) -> Result<()>;
}
