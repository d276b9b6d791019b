//! Cache Store Module
//!
//! Main cache engine: a HashMap behind a single reader/writer lock, with lazy
//! TTL expiration on access and an explicit sweep for everything else.

use std::collections::hash_map::{Entry, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::trace;

use crate::cache::{CacheBuilder, CacheEntry, CacheStats, Counters};
use crate::config::CacheConfig;
use crate::error::{BuildError, CacheError, Result};
use crate::tasks::SweeperHandle;

// == Table ==
/// Shared state behind a cache. The sweeper only holds a weak reference to it.
#[derive(Debug)]
pub(crate) struct Table<V> {
    pub(crate) entries: RwLock<HashMap<String, CacheEntry<V>>>,
    pub(crate) size_hint: usize,
    pub(crate) counters: Counters,
}

impl<V> Table<V> {
    fn with_capacity(size_hint: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(size_hint)),
            size_hint,
            counters: Counters::default(),
        }
    }

    // == Cleanup ==
    /// Removes every entry whose TTL has elapsed and returns how many went.
    pub(crate) fn cleanup(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired_at(now));
            before - entries.len()
        };

        self.counters.record_expirations(removed);
        trace!(removed, "cleanup sweep finished");
        removed
    }
}

// == Cache ==
/// Thread-safe key/value cache with per-key TTL.
///
/// Every key maps to a value of type `V`. A live key is write-once: [`set`]
/// refuses to overwrite it until its TTL has elapsed. Expired entries are
/// evicted lazily by the operation that touches them, or in bulk by
/// [`cleanup`], which can also run on a background sweeper (see
/// [`CacheBuilder::cleanup`]).
///
/// All operations take `&self`; wrap the cache in an [`Arc`] to share it
/// between threads. Values are cloned out on read, so wrap expensive values
/// in an `Arc` as well.
///
/// Two calls are never atomic together: a concurrent [`del`], [`clear`] or
/// [`cleanup`] may remove a key between a `set` and the following `get`.
///
/// [`set`]: Cache::set
/// [`del`]: Cache::del
/// [`clear`]: Cache::clear
/// [`cleanup`]: Cache::cleanup
#[derive(Debug)]
pub struct Cache<V> {
    table: Arc<Table<V>>,
    sweeper: Option<SweeperHandle>,
}

impl<V> Cache<V> {
    // == Constructors ==
    /// Creates an empty cache with no background cleanup.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty cache whose table is pre-sized for `size_hint` entries.
    ///
    /// The hint only affects allocation; the cache is never bounded by it.
    pub fn with_capacity(size_hint: usize) -> Self {
        Self {
            table: Arc::new(Table::with_capacity(size_hint)),
            sweeper: None,
        }
    }

    /// Returns a builder for configuring size and background cleanup.
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    pub(crate) fn table(&self) -> &Arc<Table<V>> {
        &self.table
    }

    pub(crate) fn attach_sweeper(&mut self, sweeper: SweeperHandle) {
        self.sweeper = Some(sweeper);
    }

    // == Set ==
    /// Stores a value under `key` unless a live entry already holds it.
    ///
    /// A `ttl` of `None` or zero stores the entry without expiration.
    /// An expired occupant is replaced silently.
    ///
    /// # Errors
    /// [`CacheError::KeyExists`] if the key is present and not expired; the
    /// stored value is left untouched.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let mut entries = self.table.entries.write();
        match entries.entry(key.into()) {
            Entry::Occupied(mut slot) => {
                if !slot.get().is_expired() {
                    return Err(CacheError::KeyExists);
                }
                slot.insert(CacheEntry::new(value, ttl));
                self.table.counters.record_expirations(1);
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(value, ttl));
            }
        }
        Ok(())
    }

    // == Has ==
    /// Reports whether `key` holds a live entry, without cloning the value.
    ///
    /// Finding the key expired evicts it.
    ///
    /// # Errors
    /// [`CacheError::KeyNotFound`] or [`CacheError::Expired`].
    pub fn has(&self, key: &str) -> Result<bool> {
        self.lookup(key, |_| true)
    }

    // == TTL ==
    /// Returns the remaining lifetime of a live key, `None` if it never expires.
    ///
    /// # Errors
    /// Same as [`has`](Cache::has).
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.lookup(key, CacheEntry::ttl_remaining)
    }

    // == Delete ==
    /// Removes a live key.
    ///
    /// # Errors
    /// [`CacheError::KeyNotFound`] or [`CacheError::Expired`] when the key is
    /// not live; deleting an absent key is not a silent success.
    pub fn del(&self, key: &str) -> Result<()> {
        self.has(key)?;

        // A concurrent del, cleanup or clear can win here; the key ends up
        // absent either way.
        self.table.entries.write().remove(key);
        Ok(())
    }

    // == Delete By Prefix ==
    /// Removes every key starting with `prefix` and returns how many were removed.
    ///
    /// Matching is a literal prefix comparison. Expired entries are counted too.
    pub fn del_prefix(&self, prefix: &str) -> usize {
        let removed = {
            let mut entries = self.table.entries.write();
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            before - entries.len()
        };

        trace!(prefix, removed, "deleted keys by prefix");
        removed
    }

    // == Clear ==
    /// Drops every entry, reallocating the table at its original size hint.
    ///
    /// Never fails; the `Result` mirrors the other mutating operations.
    pub fn clear(&self) -> Result<()> {
        let fresh = HashMap::with_capacity(self.table.size_hint);
        let stale = std::mem::replace(&mut *self.table.entries.write(), fresh);

        trace!(dropped = stale.len(), "cache cleared");
        Ok(())
    }

    // == Cleanup ==
    /// Evicts every expired entry and returns the number removed.
    ///
    /// Entries without expiration are never touched.
    pub fn cleanup(&self) -> usize {
        self.table.cleanup()
    }

    // == Length ==
    /// Returns the number of entries physically held.
    ///
    /// The count includes expired entries that no operation or sweep has
    /// evicted yet, so it can disagree with [`has`](Cache::has).
    pub fn len(&self) -> usize {
        self.table.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if no entries are held, expired or not.
    pub fn is_empty(&self) -> bool {
        self.table.entries.read().is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.table.counters.snapshot(self.len())
    }

    // == Background Cleanup ==
    /// Returns true while a background sweeper is attached and not stopped.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .as_ref()
            .is_some_and(|sweeper| !sweeper.is_stopped())
    }

    /// Stops the background sweeper, if any. Idempotent.
    pub fn stop_cleanup(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    /// Shared lookup for `has`/`ttl`/`get`: reads under the shared lock and
    /// only takes the exclusive lock to evict an expired entry.
    fn lookup<R>(&self, key: &str, read: impl FnOnce(&CacheEntry<V>) -> R) -> Result<R> {
        {
            let entries = self.table.entries.read();
            match entries.get(key) {
                None => return Err(CacheError::KeyNotFound),
                Some(entry) if !entry.is_expired() => return Ok(read(entry)),
                Some(_) => {}
            }
        }

        self.evict_expired(key);
        Err(CacheError::Expired)
    }

    fn evict_expired(&self, key: &str) {
        let mut entries = self.table.entries.write();
        // Re-check: a set may have replaced the entry between the two locks.
        if entries.get(key).is_some_and(CacheEntry::is_expired) {
            entries.remove(key);
            self.table.counters.record_expirations(1);
        }
    }
}

impl<V: Clone> Cache<V> {
    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// Finding the key expired evicts it; the stale value is never returned.
    ///
    /// # Errors
    /// [`CacheError::KeyNotFound`] or [`CacheError::Expired`].
    pub fn get(&self, key: &str) -> Result<V> {
        let result = self.lookup(key, |entry| entry.value.clone());
        match result {
            Ok(_) => self.table.counters.record_hit(),
            Err(_) => self.table.counters.record_miss(),
        }
        result
    }
}

impl<V> Cache<V>
where
    V: Send + Sync + 'static,
{
    /// Builds a cache from a [`CacheConfig`].
    ///
    /// # Errors
    /// See [`CacheBuilder::build`].
    pub fn from_config(config: &CacheConfig) -> std::result::Result<Self, BuildError> {
        CacheBuilder::from_config(config).build()
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const SHORT: Duration = Duration::from_millis(10);
    const PAST_SHORT: Duration = Duration::from_millis(30);
    const LONG: Duration = Duration::from_secs(60);

    #[test]
    fn test_store_new() {
        let cache: Cache<String> = Cache::new();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert!(!cache.is_sweeping());
    }

    #[test]
    fn test_store_set_and_get() {
        let cache = Cache::new();

        cache.set("key1", "value1".to_string(), None).unwrap();
        let value = cache.get("key1").unwrap();

        assert_eq!(value, "value1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let cache: Cache<String> = Cache::new();
        assert_eq!(cache.get("nonexistent"), Err(CacheError::KeyNotFound));
    }

    #[test]
    fn test_store_rejects_live_overwrite() {
        let cache = Cache::new();

        cache.set("key1", 1, Some(LONG)).unwrap();
        assert_eq!(cache.set("key1", 2, Some(LONG)), Err(CacheError::KeyExists));
        assert_eq!(cache.set("key1", 3, None), Err(CacheError::KeyExists));

        assert_eq!(cache.get("key1"), Ok(1));
    }

    #[test]
    fn test_store_rejects_overwrite_of_non_expiring_key() {
        let cache = Cache::new();

        cache.set("key1", 1, None).unwrap();
        assert_eq!(cache.set("key1", 2, Some(SHORT)), Err(CacheError::KeyExists));
        assert_eq!(cache.get("key1"), Ok(1));
    }

    #[test]
    fn test_store_overwrites_after_expiry() {
        let cache = Cache::new();

        cache.set("key1", "old", Some(SHORT)).unwrap();
        sleep(PAST_SHORT);

        cache.set("key1", "new", None).unwrap();
        assert_eq!(cache.get("key1"), Ok("new"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_store_get_expired_evicts() {
        let cache = Cache::new();

        cache.set("key1", "value1", Some(SHORT)).unwrap();
        assert!(cache.get("key1").is_ok());

        sleep(PAST_SHORT);

        assert_eq!(cache.get("key1"), Err(CacheError::Expired));
        assert_eq!(cache.has("key1"), Err(CacheError::KeyNotFound));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_has() {
        let cache = Cache::new();

        cache.set("key1", 1, None).unwrap();
        cache.set("key2", 2, Some(SHORT)).unwrap();

        assert_eq!(cache.has("key1"), Ok(true));
        assert_eq!(cache.has("missing"), Err(CacheError::KeyNotFound));

        sleep(PAST_SHORT);

        assert_eq!(cache.has("key2"), Err(CacheError::Expired));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_zero_ttl_never_expires() {
        let cache = Cache::new();

        cache.set("key1", 1, Some(Duration::ZERO)).unwrap();
        sleep(PAST_SHORT);

        assert_eq!(cache.get("key1"), Ok(1));
        assert_eq!(cache.ttl("key1"), Ok(None));
    }

    #[test]
    fn test_store_ttl() {
        let cache = Cache::new();

        cache.set("key1", 1, Some(LONG)).unwrap();
        let remaining = cache.ttl("key1").unwrap().unwrap();
        assert!(remaining <= LONG);
        assert!(remaining > LONG - Duration::from_secs(5));

        assert_eq!(cache.ttl("missing"), Err(CacheError::KeyNotFound));
    }

    #[test]
    fn test_store_delete() {
        let cache = Cache::new();

        cache.set("key1", 1, None).unwrap();
        cache.del("key1").unwrap();

        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), Err(CacheError::KeyNotFound));
    }

    #[test]
    fn test_store_delete_nonexistent() {
        let cache: Cache<u32> = Cache::new();
        assert_eq!(cache.del("nonexistent"), Err(CacheError::KeyNotFound));
    }

    #[test]
    fn test_store_delete_expired() {
        let cache = Cache::new();

        cache.set("key1", 1, Some(SHORT)).unwrap();
        sleep(PAST_SHORT);

        assert_eq!(cache.del("key1"), Err(CacheError::Expired));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_del_prefix() {
        let cache = Cache::new();

        for i in 0..10 {
            cache.set(format!("user_{i}"), i, None).unwrap();
        }
        cache.set("key1", 100, None).unwrap();

        assert_eq!(cache.del_prefix("user_"), 10);
        assert_eq!(cache.del_prefix("user_"), 0);
        assert_eq!(cache.get("key1"), Ok(100));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_del_prefix_is_literal() {
        let cache = Cache::new();

        cache.set("a.b", 1, None).unwrap();
        cache.set("axb", 2, None).unwrap();
        cache.set("user*", 3, None).unwrap();

        assert_eq!(cache.del_prefix("a."), 1);
        assert_eq!(cache.del_prefix("user*"), 1);
        assert_eq!(cache.del_prefix("*"), 0);
        assert_eq!(cache.get("axb"), Ok(2));
    }

    #[test]
    fn test_store_clear() {
        let cache = Cache::with_capacity(16);

        cache.set("key1", 1, None).unwrap();
        cache.set("key2", 2, Some(LONG)).unwrap();

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), Err(CacheError::KeyNotFound));

        cache.set("key1", 3, None).unwrap();
        assert_eq!(cache.get("key1"), Ok(3));
    }

    #[test]
    fn test_store_clear_idempotent() {
        let cache: Cache<u32> = Cache::new();

        cache.clear().unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_cleanup_expired() {
        let cache = Cache::new();

        for i in 0..5 {
            cache.set(format!("short_{i}"), i, Some(SHORT)).unwrap();
        }
        cache.set("long", 10, Some(LONG)).unwrap();
        cache.set("forever", 11, None).unwrap();

        sleep(PAST_SHORT);

        // Unswept expired entries still count.
        assert_eq!(cache.len(), 7);

        assert_eq!(cache.cleanup(), 5);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("long"), Ok(10));
        assert_eq!(cache.get("forever"), Ok(11));
        assert_eq!(cache.get("short_0"), Err(CacheError::KeyNotFound));

        assert_eq!(cache.cleanup(), 0);
    }

    #[test]
    fn test_store_stats() {
        let cache = Cache::new();

        cache.set("key1", 1, None).unwrap();
        cache.get("key1").unwrap(); // hit
        let _ = cache.get("nonexistent"); // miss
        let _ = cache.has("nonexistent"); // not counted

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_expiration_counted_once() {
        let cache = Cache::new();

        cache.set("key1", 1, Some(SHORT)).unwrap();
        cache.set("key2", 2, Some(SHORT)).unwrap();
        sleep(PAST_SHORT);

        let _ = cache.get("key1");
        cache.cleanup();

        assert_eq!(cache.stats().expirations, 2);
    }
}
