//! Bounded TTL Cache Module
//!
//! In-memory cache combining HashMap storage with insertion-order eviction
//! and per-entry expiry timers.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{Cache, CacheEntry, CacheStats, LruTracker};
use crate::config::CacheConfig;

// == Memory Cache ==
/// Bounded in-memory cache with per-entry TTL.
///
/// When full, inserting a new key evicts the oldest *inserted* key;
/// reads never change eviction order. Each entry with a non-zero TTL gets a
/// timer task that removes it once the TTL elapses. Timers need a Tokio
/// runtime; without one, expiry still happens lazily on access.
#[derive(Debug)]
pub struct MemoryCache<V> {
    inner: Arc<Mutex<MemoryInner<V>>>,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL used when `set` is called without one
    default_ttl: Duration,
}

#[derive(Debug)]
struct MemoryInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order; keys are touched only when first inserted
    order: LruTracker,
    timers: HashMap<String, JoinHandle<()>>,
    stats: CacheStats,
    next_generation: u64,
}

impl<V> MemoryInner<V> {
    fn cancel_timer(&mut self, key: &str) {
        if let Some(timer) = self.timers.remove(key) {
            timer.abort();
        }
    }

    /// Removes an entry along with its order slot and timer.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        self.cancel_timer(key);
        self.order.remove(key);
        let removed = self.entries.remove(key);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    /// Timer callback: drops the entry only if it is still the write the
    /// timer was scheduled for.
    fn expire_if_current(&mut self, key: &str, generation: u64) {
        let is_current = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation);
        if !is_current {
            return;
        }

        // The firing timer is the one in the map; drop its handle without aborting itself.
        self.timers.remove(key);
        self.order.remove(key);
        self.entries.remove(key);
        self.stats.record_expiration();
        self.stats.set_total_entries(self.entries.len());
        debug!(key, "cache entry expired");
    }

    fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
            self.stats.record_expiration();
        }
        expired_keys.len()
    }
}

impl<V> Drop for MemoryInner<V> {
    fn drop(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

impl<V: Send + 'static> MemoryCache<V> {
    // == Constructor ==
    /// Creates a new MemoryCache with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries; 0 is treated as 1
    /// * `default_ttl` - TTL applied when `set` gets none; zero = never expire
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                entries: HashMap::new(),
                order: LruTracker::new(),
                timers: HashMap::new(),
                stats: CacheStats::new(),
                next_generation: 0,
            })),
            max_size: max_size.max(1),
            default_ttl,
        }
    }

    /// Creates a MemoryCache sized from the configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size, config.default_ttl())
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the value is replaced, the TTL restarts and
    /// the key keeps its insertion position. If the cache is full and the key
    /// is new, the oldest inserted entry is evicted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - TTL for this entry (uses default_ttl if None, zero = never expire)
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let is_overwrite = inner.entries.contains_key(key);
        if is_overwrite {
            inner.cancel_timer(key);
        } else if inner.entries.len() >= self.max_size {
            if let Some(evicted_key) = inner.order.evict_oldest() {
                inner.cancel_timer(&evicted_key);
                inner.entries.remove(&evicted_key);
                inner.stats.record_eviction();
                debug!(key = %evicted_key, "evicted oldest cache entry");
            }
        }

        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value, ttl, generation));
        if !is_overwrite {
            inner.order.touch(key);
        }
        inner.stats.set_total_entries(inner.entries.len());

        if !ttl.is_zero() {
            if let Some(timer) = self.schedule_expiry(key, ttl, generation) {
                inner.timers.insert(key.to_string(), timer);
            }
        }
    }

    fn schedule_expiry(&self, key: &str, ttl: Duration, generation: u64) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(key, "no runtime available, expiry will be checked on access");
            return None;
        };

        let state: Weak<Mutex<MemoryInner<V>>> = Arc::downgrade(&self.inner);
        let key = key.to_string();
        Some(runtime.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(state) = state.upgrade() {
                state.lock().expire_if_current(&key, generation);
            }
        }))
    }

    /// Runs `read` on a live entry, removing it first if it has expired.
    fn with_live<R>(&self, key: &str, read: impl FnOnce(&V) -> R) -> Option<R> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired_at(Instant::now()),
            None => {
                inner.stats.record_miss();
                return None;
            }
        };

        if expired {
            inner.remove_entry(key);
            inner.stats.record_expiration();
            inner.stats.record_miss();
            return None;
        }

        inner.stats.record_hit();
        inner.entries.get(key).map(|entry| read(&entry.value))
    }

    // == Has ==
    /// Returns true if the key holds a live entry. Expired entries are removed.
    pub fn has(&self, key: &str) -> bool {
        self.with_live(key, |_| ()).is_some()
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes all entries and cancels all timers.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        for (_, timer) in inner.timers.drain() {
            timer.abort();
        }
        let cleared = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        inner.stats.set_total_entries(0);
        debug!(cleared, hit_rate = inner.stats.hit_rate(), "cleared memory cache");
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.cleanup_expired();
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Keys ==
    /// Returns live keys, oldest inserted first.
    pub fn keys(&self) -> Vec<String> {
        let mut inner = self.inner.lock();
        inner.cleanup_expired();
        let mut keys: Vec<String> = inner.order.iter().map(str::to_string).collect();
        keys.reverse();
        keys
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

impl<V: Clone + Send + 'static> MemoryCache<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if found and not expired. Expired entries are
    /// removed and counted as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        self.with_live(key, V::clone)
    }
}

impl<V: Clone + Send + 'static> Cache<V> for MemoryCache<V> {
    fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        MemoryCache::set(self, key, value, ttl);
    }

    fn get(&self, key: &str) -> Option<V> {
        MemoryCache::get(self, key)
    }

    fn has(&self, key: &str) -> bool {
        MemoryCache::has(self, key)
    }

    fn delete(&self, key: &str) {
        MemoryCache::delete(self, key);
    }

    fn clear(&self) {
        MemoryCache::clear(self);
    }
}
