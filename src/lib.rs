//! mcache - A simple, fast, thread-safe in-memory cache
//!
//! Stores values of one type under string keys, each with an optional
//! time-to-live. A live key is never silently overwritten: [`Cache::set`]
//! fails with [`CacheError::KeyExists`] until the previous entry expires,
//! which makes the cache a natural fit for compute-once memoization.
//!
//! Expired entries are evicted lazily by the operation that touches them, by
//! an explicit [`Cache::cleanup`], or by a background sweeper on a Tokio
//! runtime.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use mcache::{Cache, CacheError};
//!
//! let cache = Cache::new();
//!
//! cache.set("key", "value".to_string(), Some(Duration::from_secs(300))).unwrap();
//! assert_eq!(cache.get("key").unwrap(), "value");
//!
//! // A live key is write-once.
//! let err = cache.set("key", "other".to_string(), None).unwrap_err();
//! assert_eq!(err, CacheError::KeyExists);
//!
//! assert_eq!(cache.has("missing"), Err(CacheError::KeyNotFound));
//! cache.del("key").unwrap();
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheBuilder, CacheStats};
pub use config::CacheConfig;
pub use error::{BuildError, CacheError, Result};
pub use tasks::{spawn_sweeper, SweeperHandle};
