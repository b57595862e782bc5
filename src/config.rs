//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries the bounded TTL cache can hold
    pub max_size: usize,
    /// Default TTL in milliseconds for bounded TTL cache entries (0 = never expire)
    pub default_ttl_ms: u64,
    /// Capacity of the LRU cache
    pub lru_capacity: usize,
    /// Key prefix namespacing the durable cache inside its storage medium
    pub storage_prefix: String,
    /// Interval in seconds between durable cache purge runs
    pub purge_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Bounded TTL cache capacity (default: 100)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `LRU_CAPACITY` - LRU cache capacity (default: 100)
    /// - `STORAGE_PREFIX` - Durable cache key prefix (default: `cache_`)
    /// - `PURGE_INTERVAL_SECS` - Durable purge frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_env("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            default_ttl_ms: parse_env("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            lru_capacity: parse_env("LRU_CAPACITY").unwrap_or(defaults.lru_capacity),
            storage_prefix: env::var("STORAGE_PREFIX").unwrap_or(defaults.storage_prefix),
            purge_interval: parse_env("PURGE_INTERVAL_SECS").unwrap_or(defaults.purge_interval),
        }
    }

    /// Rejects values that would make a cache unusable.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.lru_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "lru_capacity must be at least 1".to_string(),
            ));
        }
        if self.purge_interval == 0 {
            return Err(CacheError::InvalidConfig(
                "purge_interval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    /// Default TTL as a [`Duration`].
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl_ms: 5 * 60 * 1000,
            lru_capacity: 100,
            storage_prefix: "cache_".to_string(),
            purge_interval: 60,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 100);
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.lru_capacity, 100);
        assert_eq!(config.storage_prefix, "cache_");
        assert_eq!(config.purge_interval, 60);
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_MAX_SIZE");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("LRU_CAPACITY");
        env::remove_var("STORAGE_PREFIX");
        env::remove_var("PURGE_INTERVAL_SECS");

        let config = CacheConfig::from_env();
        assert_eq!(config.max_size, 100);
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.lru_capacity, 100);
        assert_eq!(config.storage_prefix, "cache_");
        assert_eq!(config.purge_interval, 60);
    }

    #[test]
    fn test_config_validate() {
        assert!(CacheConfig::default().validate().is_ok());

        let config = CacheConfig {
            max_size: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));

        let config = CacheConfig {
            lru_capacity: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }
}
