//! In-memory response cache implementation.

use async_trait::async_trait;
use pitfund_core::{EngineError, ResponseCache, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Vec<u8>>,
    insertion_order: VecDeque<String>,
    total_bytes: u64,
}

/// Simple in-memory response cache for testing and development.
///
/// Entries live in a `Mutex`-protected map and are lost when the cache is
/// dropped. The size cap evicts in insertion order.
#[derive(Debug)]
pub struct InMemoryResponseCache {
    state: Mutex<MemoryState>,
    max_bytes: u64,
}

impl InMemoryResponseCache {
    /// Create an empty cache with the given byte cap.
    #[must_use]
    pub fn new(max_bytes: u64) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            max_bytes,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| EngineError::Cache(e.to_string()))
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.lock()?;
        Ok(state.entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(old) = state.entries.insert(key.to_string(), value.to_vec()) {
            state.total_bytes -= old.len() as u64;
            state.insertion_order.retain(|k| k != key);
        }
        state.insertion_order.push_back(key.to_string());
        state.total_bytes += value.len() as u64;

        while state.total_bytes > self.max_bytes {
            let Some(oldest) = state.insertion_order.pop_front() else {
                break;
            };
            if let Some(evicted) = state.entries.remove(&oldest) {
                state.total_bytes -= evicted.len() as u64;
                debug!("Evicted in-memory cache entry {}", oldest);
            }
        }
        Ok(())
    }

    async fn size_bytes(&self) -> Result<u64> {
        Ok(self.lock()?.total_bytes)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.entries.clear();
        state.insertion_order.clear();
        state.total_bytes = 0;
        Ok(())
    }
}
