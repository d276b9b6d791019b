//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Outcome of a cache operation that could not be served.
///
/// Variants carry no payload so they are free to construct and compare on the
/// hot path.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The key has never been set, or was already removed
    #[error("key not found")]
    KeyNotFound,

    /// The key was set but its TTL has elapsed; the lookup evicted it
    #[error("key expired")]
    Expired,

    /// A live entry already occupies the key, the write was rejected
    #[error("key already exists")]
    KeyExists,
}

impl CacheError {
    // == Is Unavailable ==
    /// Returns true when the value is simply not there (missing or expired).
    ///
    /// Callers that only care about presence can treat both the same way.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::KeyNotFound | CacheError::Expired)
    }
}

// == Build Error Enum ==
/// Errors raised while constructing a cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The background cleanup interval must be non-zero
    #[error("cleanup interval must be greater than zero")]
    ZeroCleanupInterval,

    /// A background cleanup was requested outside of a Tokio runtime
    #[error("background cleanup requires a running Tokio runtime")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
