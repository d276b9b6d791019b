//! Cache Builder Module
//!
//! Construction-time options for [`Cache`]: table pre-sizing and the
//! background cleanup sweeper.

use std::marker::PhantomData;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::BuildError;
use crate::tasks::spawn_sweeper_on;

// == Cache Builder ==
/// Builder for [`Cache`].
///
/// # Example
/// ```ignore
/// let cache: Cache<String> = Cache::builder()
///     .size(10_000)
///     .cleanup(Duration::from_secs(1))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct CacheBuilder<V> {
    size: usize,
    cleanup_interval: Option<Duration>,
    _value: PhantomData<fn() -> V>,
}

impl<V> CacheBuilder<V> {
    /// Creates a builder with no size hint and no background cleanup.
    pub fn new() -> Self {
        Self {
            size: 0,
            cleanup_interval: None,
            _value: PhantomData,
        }
    }

    /// Creates a builder preloaded from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            size: config.initial_capacity,
            cleanup_interval: config.cleanup_interval,
            _value: PhantomData,
        }
    }

    /// Pre-sizes the table for `size` entries. Performance hint only.
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Runs [`Cache::cleanup`] in the background every `interval`.
    ///
    /// The sweeper is spawned on the current Tokio runtime when the cache is
    /// built, and stops when the cache is dropped.
    pub fn cleanup(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }
}

impl<V> CacheBuilder<V>
where
    V: Send + Sync + 'static,
{
    // == Build ==
    /// Builds the cache and starts the sweeper if one was requested.
    ///
    /// # Errors
    /// - [`BuildError::ZeroCleanupInterval`] if the cleanup interval is zero
    /// - [`BuildError::NoRuntime`] if cleanup was requested outside a Tokio runtime
    pub fn build(self) -> Result<Cache<V>, BuildError> {
        let runtime = match self.cleanup_interval {
            Some(interval) if interval.is_zero() => {
                return Err(BuildError::ZeroCleanupInterval);
            }
            Some(interval) => {
                let handle = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;
                Some((handle, interval))
            }
            None => None,
        };

        let mut cache = Cache::with_capacity(self.size);
        if let Some((handle, interval)) = runtime {
            let sweeper = spawn_sweeper_on(&handle, cache.table(), interval);
            cache.attach_sweeper(sweeper);
        }

        Ok(cache)
    }
}

impl<V> Default for CacheBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}
