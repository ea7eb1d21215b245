//! Engine configuration and request/config precedence resolution.

use crate::error::{EngineError, Result};
use crate::types::SnapshotRequest;
use std::path::PathBuf;

/// SEC EDGAR hard request ceiling in requests per second.
///
/// Upstream policy constraint; configuration above this value is rejected
/// at construction time.
pub const SEC_MAX_RPS: f64 = 10.0;

/// Default request rate, leaving headroom below the SEC ceiling.
pub const DEFAULT_RPS: f64 = 8.0;

/// Default on-disk response cache size cap (5 GiB).
pub const DEFAULT_CACHE_BYTES: u64 = 5 * 1024 * 1024 * 1024;

/// Engine-wide configuration.
///
/// Immutable once handed to the engine. The SEC requires an identifying
/// `User-Agent` of the form `Name/Version email`; construction validates
/// the shape and the request-rate ceiling.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// SEC `User-Agent` header value, format `Name/Version email`.
    pub user_agent: String,
    /// Root directory for the on-disk response cache.
    pub cache_dir: PathBuf,
    /// Response cache size cap in bytes.
    pub max_cache_bytes: u64,
    /// Outbound requests per second (must not exceed [`SEC_MAX_RPS`]).
    pub rate_limit_rps: f64,
    /// Default amendment preference; overridden by the request.
    pub allow_amendments: bool,
    /// Default LTM allowance; overridden by the request.
    pub allow_ltm: bool,
    /// Default estimate allowance; overridden by the request. Must stay
    /// `false` for point-in-time research.
    pub allow_estimates: bool,
    /// Maximum tickers processed concurrently.
    pub max_concurrency: usize,
    /// Whether schema violations are fatal (`true`) or logged (`false`).
    pub validate: bool,
}

impl EngineConfig {
    /// Creates a configuration with defaults for everything but the
    /// user agent.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the user agent is empty
    /// or not of the form `Name/Version email`.
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let config = Self {
            user_agent: user_agent.into(),
            cache_dir: PathBuf::from(".cache"),
            max_cache_bytes: DEFAULT_CACHE_BYTES,
            rate_limit_rps: DEFAULT_RPS,
            allow_amendments: true,
            allow_ltm: false,
            allow_estimates: false,
            max_concurrency: 4,
            validate: true,
        };
        config.check()?;
        Ok(config)
    }

    /// Sets the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the response cache size cap.
    #[must_use]
    pub const fn with_max_cache_bytes(mut self, bytes: u64) -> Self {
        self.max_cache_bytes = bytes;
        self
    }

    /// Sets the request rate.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if the rate is not
    /// positive or exceeds [`SEC_MAX_RPS`].
    pub fn with_rate_limit_rps(mut self, rps: f64) -> Result<Self> {
        self.rate_limit_rps = rps;
        self.check()?;
        Ok(self)
    }

    /// Sets the default amendment preference.
    #[must_use]
    pub const fn with_amendments(mut self, allow: bool) -> Self {
        self.allow_amendments = allow;
        self
    }

    /// Sets the worker-pool width.
    #[must_use]
    pub fn with_max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = workers.max(1);
        self
    }

    /// Sets whether schema violations abort the build.
    #[must_use]
    pub const fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    fn check(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() || !self.user_agent.contains(' ') {
            return Err(EngineError::InvalidParameter(
                "user agent must follow the format 'Name/Version email'".to_string(),
            ));
        }
        if self.rate_limit_rps <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "rate limit must be positive, got {}",
                self.rate_limit_rps
            )));
        }
        if self.rate_limit_rps > SEC_MAX_RPS {
            return Err(EngineError::InvalidParameter(format!(
                "SEC EDGAR rate limit is {SEC_MAX_RPS} RPS maximum, got {}",
                self.rate_limit_rps
            )));
        }
        Ok(())
    }
}

/// Merged view of [`EngineConfig`] and [`SnapshotRequest`] with clear
/// precedence: the request wins on every flag it carries.
///
/// Downstream components read flags from here only, never from the request
/// and config separately.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    /// Prefer `/A` amendments over originals.
    pub allow_amendments: bool,
    /// Include LTM/TTM columns (external ingestion only).
    pub allow_ltm: bool,
    /// Include forward estimate columns (never in PIT builds).
    pub allow_estimates: bool,
    /// SEC `User-Agent` string; always from the engine config, never
    /// overridable per request.
    pub user_agent: String,
}

impl ResolvedConfig {
    /// Merge request overrides on top of config defaults.
    #[must_use]
    pub fn resolve(request: &SnapshotRequest, config: &EngineConfig) -> Self {
        Self {
            allow_amendments: request.include_amendments,
            allow_ltm: request.allow_ltm,
            allow_estimates: request.allow_estimates,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Refuse configurations that would admit forward-looking data.
    ///
    /// Called at the top of every build so misconfiguration fails before
    /// any request is issued.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidParameter`] if `allow_estimates` is set.
    pub fn assert_pit_safe(&self) -> Result<()> {
        if self.allow_estimates {
            return Err(EngineError::InvalidParameter(
                "allow_estimates=true is not permitted in point-in-time builds: \
                 estimate columns contain forward-looking data"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
