//! SQLite-based response cache implementation.

use async_trait::async_trait;
use pitfund_core::{EngineError, ResponseCache, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Persistent response cache backed by a SQLite database file.
///
/// Entries are keyed by the content-addressed request key and never
/// expire; instead the cache enforces a byte-size cap by evicting the
/// oldest entries after each insert. Survives across snapshot builds.
#[derive(Debug)]
pub struct SqliteResponseCache {
    conn: Mutex<Connection>,
    max_bytes: u64,
}

impl SqliteResponseCache {
    /// Open (or create) a cache database at the given path.
    ///
    /// Parent directories are created if necessary.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema
    /// creation fails.
    pub fn new(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::Cache(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| EngineError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
            max_bytes,
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory(max_bytes: u64) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| EngineError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
            max_bytes,
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS response_cache (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                byte_len INTEGER NOT NULL,
                stored_seq INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| EngineError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_response_cache_seq
             ON response_cache(stored_seq)",
            [],
        )
        .map_err(|e| EngineError::Cache(e.to_string()))?;

        debug!("SQLite response cache schema initialized");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| EngineError::Cache(e.to_string()))
    }

    /// Evict oldest entries until the total size fits under the cap.
    fn evict_to_cap(conn: &Connection, max_bytes: u64) -> Result<()> {
        loop {
            let total: i64 = conn
                .query_row(
                    "SELECT COALESCE(SUM(byte_len), 0) FROM response_cache",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| EngineError::Cache(e.to_string()))?;
            if total as u64 <= max_bytes {
                return Ok(());
            }
            let evicted = conn
                .execute(
                    "DELETE FROM response_cache WHERE key IN (
                        SELECT key FROM response_cache ORDER BY stored_seq ASC LIMIT 1
                    )",
                    [],
                )
                .map_err(|e| EngineError::Cache(e.to_string()))?;
            if evicted == 0 {
                return Ok(());
            }
            debug!("Evicted cache entry to respect {} byte cap", max_bytes);
        }
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let body = conn
            .query_row(
                "SELECT body FROM response_cache WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        Ok(body)
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        let next_seq: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(stored_seq), 0) + 1 FROM response_cache",
                [],
                |row| row.get(0),
            )
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO response_cache (key, body, byte_len, stored_seq)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, value, value.len() as i64, next_seq],
        )
        .map_err(|e| EngineError::Cache(e.to_string()))?;
        Self::evict_to_cap(&conn, self.max_bytes)?;
        debug!("Cached {} bytes under {}", value.len(), key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM response_cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        Ok(count > 0)
    }

    async fn size_bytes(&self) -> Result<u64> {
        let conn = self.lock()?;
        let total: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(byte_len), 0) FROM response_cache",
                [],
                |row| row.get(0),
            )
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        Ok(total as u64)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM response_cache", [])
            .map_err(|e| EngineError::Cache(e.to_string()))?;
        debug!("Cleared all cached responses");
        Ok(())
    }
}
