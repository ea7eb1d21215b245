//! No-op response cache implementation.

use async_trait::async_trait;
use pitfund_core::{ResponseCache, Result};

/// A cache that stores nothing.
///
/// Every lookup misses, so every request goes to the network. Useful when
/// caching must be disabled, e.g. to verify upstream behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResponseCache;

impl NoopResponseCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResponseCache for NoopResponseCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn contains(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn size_bytes(&self) -> Result<u64> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_never_stores() {
        let cache = NoopResponseCache::new();
        cache.put("k", b"value").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(!cache.contains("k").await.unwrap());
        assert_eq!(cache.size_bytes().await.unwrap(), 0);
    }
}
