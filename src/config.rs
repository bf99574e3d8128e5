//! Cache configuration
//!
//! Defaults suit a local development server; every value can be overridden
//! through `REGCACHE_*` environment variables or command-line flags.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::warn;

use crate::cache::{CacheStore, FileCacheStore, NoopCacheStore, DEFAULT_TTL_HOURS};
use crate::data::lookup::DEFAULT_BASE_URL;
use crate::data::HttpRegistryLookup;

/// Environment variable overriding the lookup endpoint base URL
pub const ENV_BASE_URL: &str = "REGCACHE_BASE_URL";
/// Environment variable overriding the TTL in hours
pub const ENV_TTL_HOURS: &str = "REGCACHE_TTL_HOURS";
/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "REGCACHE_CACHE_DIR";

/// Errors for invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TTL could not be parsed, is negative or is too large
    #[error("Invalid TTL: '{0}'. Expected a non-negative number of hours")]
    InvalidTtl(String),

    /// The base URL is empty
    #[error("Base URL must not be empty")]
    EmptyBaseUrl,
}

/// Settings for building a `RegistryCache`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// How long an entry stays fresh
    pub ttl: Duration,
    /// Base URL of the registry lookup endpoint
    pub base_url: String,
    /// Directory for the persisted cache; `None` uses the XDG cache directory
    pub cache_dir: Option<PathBuf>,
    /// Whether the cache state is persisted at all
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: None,
            persist: true,
        }
    }
}

impl CacheConfig {
    /// Builds the default configuration with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by environment variable name
    ///
    /// Unset or empty variables leave the current value untouched.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(ENV_BASE_URL) {
            self = self.with_base_url(base_url)?;
        }
        if let Some(ttl) = get(ENV_TTL_HOURS) {
            self = self.with_ttl_hours(parse_ttl_hours(&ttl)?)?;
        }
        if let Some(cache_dir) = get(ENV_CACHE_DIR) {
            self.cache_dir = Some(PathBuf::from(cache_dir));
        }
        Ok(self)
    }

    /// Sets the TTL in whole hours
    pub fn with_ttl_hours(mut self, hours: i64) -> Result<Self, ConfigError> {
        self.ttl =
            ttl_from_hours(hours).ok_or_else(|| ConfigError::InvalidTtl(hours.to_string()))?;
        Ok(self)
    }

    /// Sets the lookup endpoint base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        self.base_url = base_url;
        Ok(self)
    }

    /// HTTP lookup client for the configured endpoint
    pub fn lookup_client(&self) -> HttpRegistryLookup {
        HttpRegistryLookup::new(self.base_url.clone())
    }

    /// Persistence adapter for the configured directory
    ///
    /// Falls back to a no-op store when persistence is disabled or no
    /// cache directory can be determined.
    pub fn store(&self) -> Arc<dyn CacheStore> {
        if !self.persist {
            return Arc::new(NoopCacheStore);
        }

        match &self.cache_dir {
            Some(dir) => Arc::new(FileCacheStore::with_dir(dir.clone())),
            None => match FileCacheStore::new() {
                Some(store) => Arc::new(store),
                None => {
                    warn!("no cache directory available, registry cache will not persist");
                    Arc::new(NoopCacheStore)
                }
            },
        }
    }
}

/// Parses a TTL given in hours
pub fn parse_ttl_hours(s: &str) -> Result<i64, ConfigError> {
    s.trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| ttl_from_hours(*hours).is_some())
        .ok_or_else(|| ConfigError::InvalidTtl(s.to_string()))
}

/// `None` for negative hours or hours past what `Duration` can hold
fn ttl_from_hours(hours: i64) -> Option<Duration> {
    if hours < 0 {
        return None;
    }
    Duration::try_hours(hours)
}
