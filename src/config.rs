//! Configuration Module
//!
//! Optional configuration for building a cache from environment variables or
//! an application's own config file. The cache never reads the environment
//! unless [`CacheConfig::from_env`] is called.

use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Cache construction parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of entries to pre-size the table for
    pub initial_capacity: usize,
    /// Background cleanup interval, None = no background cleanup
    #[serde(with = "millis")]
    pub cleanup_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MCACHE_INITIAL_CAPACITY` - Table size hint (default: 0)
    /// - `MCACHE_CLEANUP_INTERVAL_MS` - Cleanup frequency in milliseconds,
    ///   0 disables background cleanup (default: 0)
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            initial_capacity: env::var("MCACHE_INITIAL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            cleanup_interval: env::var("MCACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }
}

/// Serde adapter storing the cleanup interval as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = Option::<u64>::deserialize(deserializer)?;
        Ok(ms.filter(|ms| *ms > 0).map(Duration::from_millis))
    }
}
