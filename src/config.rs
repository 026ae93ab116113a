//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Cache and maintenance-server configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_items: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// HTTP port of the maintenance API
    pub server_port: u16,
    /// Seconds between background purge passes; 0 disables the task
    pub purge_interval: u64,
    /// Executions slower than this are kept in the slow-query log
    pub slow_query_threshold_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ITEMS` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - Maintenance API port (default: 3000)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds, 0 = off (default: 0)
    /// - `SLOW_QUERY_THRESHOLD_MS` - Slow-query threshold (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_items: env_or("MAX_ITEMS", defaults.max_items),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            purge_interval: env_or("PURGE_INTERVAL", defaults.purge_interval),
            slow_query_threshold_ms: env_or(
                "SLOW_QUERY_THRESHOLD_MS",
                defaults.slow_query_threshold_ms,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: 1000,
            default_ttl: 300,
            server_port: 3000,
            purge_interval: 0,
            slow_query_threshold_ms: 100,
        }
    }
}

/// Parses `name` from the environment, falling back on absence or garbage.
fn env_or<T: FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_items, 1000);
        assert_eq!(config.default_ttl, 300);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.purge_interval, 0);
        assert_eq!(config.slow_query_threshold_ms, 100);
    }

    #[test]
    fn test_env_or_falls_back() {
        assert_eq!(env_or("TAGCACHE_TEST_UNSET_VARIABLE", 7u64), 7);
    }

    #[test]
    fn test_env_or_parses_and_rejects_garbage() {
        env::set_var("TAGCACHE_TEST_GOOD", " 42 ");
        env::set_var("TAGCACHE_TEST_BAD", "forty-two");

        assert_eq!(env_or("TAGCACHE_TEST_GOOD", 0usize), 42);
        assert_eq!(env_or("TAGCACHE_TEST_BAD", 5usize), 5);

        env::remove_var("TAGCACHE_TEST_GOOD");
        env::remove_var("TAGCACHE_TEST_BAD");
    }
}
