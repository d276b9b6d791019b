//! Cache Module
//!
//! Provides a thread-safe in-memory cache with per-key TTL expiration.

mod builder;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use builder::CacheBuilder;
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::Cache;

pub(crate) use stats::Counters;
pub(crate) use store::Table;
