//! LRU Cache Module
//!
//! Fixed-capacity cache evicting the least recently used key.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{Cache, CacheStats, LruTracker};
use crate::config::CacheConfig;

// == LRU Cache ==
/// Fixed-capacity cache with least-recently-used eviction.
///
/// Both `get` hits and `set` move a key to the most recently used position.
/// `has` and `peek` leave recency untouched. Entries never expire.
#[derive(Debug)]
pub struct LruCache<V> {
    inner: Mutex<LruInner<V>>,
    capacity: usize,
}

#[derive(Debug)]
struct LruInner<V> {
    entries: HashMap<String, V>,
    lru: LruTracker,
    stats: CacheStats,
}

impl<V> LruCache<V> {
    /// Creates an empty cache holding at most `capacity` entries (0 is treated as 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                stats: CacheStats::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.lru_capacity)
    }

    // == Set ==
    /// Inserts or replaces a value and marks the key most recently used.
    ///
    /// If the key is new and the cache is full, the least recently used
    /// entry is evicted first.
    pub fn set(&self, key: &str, value: V) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.capacity {
            if let Some(evicted_key) = inner.lru.evict_oldest() {
                inner.entries.remove(&evicted_key);
                inner.stats.record_eviction();
                debug!(key = %evicted_key, "evicted least recently used entry");
            }
        }

        inner.entries.insert(key.to_string(), value);
        inner.lru.touch(key);
        inner.stats.set_total_entries(inner.entries.len());
    }

    // == Has ==
    /// Membership test without recency effect.
    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry. Returns true if it was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.lru.remove(key);
            inner.stats.set_total_entries(inner.entries.len());
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.lru.clear();
        inner.stats.set_total_entries(0);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().lru.iter().map(str::to_string).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }
}

impl<V: Clone> LruCache<V> {
    // == Get ==
    /// Returns the value and marks the key most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.entries.get(key) {
            Some(value) => {
                let value = value.clone();
                inner.lru.touch(key);
                inner.stats.record_hit();
                Some(value)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    /// Returns the value without touching recency or stats.
    pub fn peek(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.get(key).cloned()
    }
}

/// The TTL argument is ignored: LRU entries only leave by eviction or removal.
impl<V: Clone + Send> Cache<V> for LruCache<V> {
    fn set(&self, key: &str, value: V, _ttl: Option<Duration>) {
        LruCache::set(self, key, value);
    }

    fn get(&self, key: &str) -> Option<V> {
        LruCache::get(self, key)
    }

    fn has(&self, key: &str) -> bool {
        LruCache::has(self, key)
    }

    fn delete(&self, key: &str) {
        LruCache::delete(self, key);
    }

    fn clear(&self) {
        LruCache::clear(self);
    }
}
