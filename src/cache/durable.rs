//! Durable Cache Module
//!
//! Key/value cache persisted in a [`Storage`] medium, namespaced by a key
//! prefix. Expiry is checked only when a record is read, since the medium
//! outlives the process and in-process timers would not.
//!
//! Medium failures never reach the caller: reads that fail to parse are
//! misses, writes that fail are logged and dropped.

use std::marker::PhantomData;
use std::time::Duration;

use chrono::Utc;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::storage::{MemoryStorage, Storage};

/// Record layout written to the medium.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord<T> {
    value: T,
    /// Unix milliseconds at write time
    stored_at: i64,
    /// Milliseconds, 0 = never expires
    ttl: u64,
}

impl<T> StoredRecord<T> {
    fn is_expired_at(&self, now_ms: i64) -> bool {
        self.ttl > 0 && i128::from(now_ms) - i128::from(self.stored_at) > i128::from(self.ttl)
    }
}

/// Converts a TTL to whole milliseconds for storage.
///
/// Saturates at `u64::MAX`. A non-zero TTL under one millisecond rounds up
/// to 1 so it does not turn into "never expires".
fn ttl_millis(ttl: Duration) -> u64 {
    if ttl.is_zero() {
        return 0;
    }
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// == Durable Cache ==
/// Cache persisted in a shared key/value medium.
///
/// Every physical key carries `prefix`, so several caches can share one
/// medium. Prefixes are compared literally: one cache's prefix must not be
/// a prefix of another's on the same medium.
#[derive(Debug)]
pub struct DurableCache<V, S = MemoryStorage> {
    storage: S,
    prefix: String,
    default_ttl: Duration,
    _value: PhantomData<fn() -> V>,
}

impl<V, S: Storage> DurableCache<V, S> {
    /// Creates a cache over `storage` whose entries never expire by default.
    pub fn new(storage: S, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
            default_ttl: Duration::ZERO,
            _value: PhantomData,
        }
    }

    pub fn from_config(config: &CacheConfig, storage: S) -> Self {
        Self::new(storage, config.storage_prefix.clone())
    }

    /// Sets the TTL used when `set` gets none.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Physical keys belonging to this cache.
    fn own_keys(&self) -> Vec<String> {
        self.storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&self.prefix))
            .collect()
    }

    fn remove_physical(&self, storage_key: &str) {
        if let Err(err) = self.storage.remove_item(storage_key) {
            warn!(key = storage_key, error = %err, "failed to remove cache record");
        }
    }

    // == Delete ==
    pub fn delete(&self, key: &str) {
        self.remove_physical(&self.storage_key(key));
    }

    // == Clear ==
    /// Removes every record carrying this cache's prefix. Other keys in the
    /// medium are left alone.
    pub fn clear(&self) {
        let keys = self.own_keys();
        for key in &keys {
            self.remove_physical(key);
        }
        debug!(prefix = %self.prefix, removed = keys.len(), "cleared durable cache");
    }

    // == Keys ==
    /// Logical keys (prefix stripped) currently stored, including records not
    /// yet found to be expired.
    pub fn keys(&self) -> Vec<String> {
        self.own_keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }

    // == Purge Expired ==
    /// Removes expired and unreadable records of this cache.
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self) -> usize {
        let now = now_ms();
        let mut removed = 0;

        for key in self.own_keys() {
            let Some(raw) = self.storage.get_item(&key) else {
                continue;
            };
            let stale = match serde_json::from_str::<StoredRecord<IgnoredAny>>(&raw) {
                Ok(record) => record.is_expired_at(now),
                Err(_) => true,
            };
            if stale {
                self.remove_physical(&key);
                removed += 1;
            }
        }

        if removed > 0 {
            info!(prefix = %self.prefix, removed, "purged stale durable cache records");
        }
        removed
    }
}

impl<V: Serialize, S: Storage> DurableCache<V, S> {
    // == Set ==
    /// Writes a value with optional TTL (default: never expires).
    ///
    /// Serialization and medium failures are logged and the call becomes a
    /// no-op.
    pub fn set(&self, key: &str, value: &V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let record = StoredRecord {
            value,
            stored_at: now_ms(),
            ttl: ttl_millis(ttl),
        };

        let text = match serde_json::to_string(&record) {
            Ok(text) => text,
            Err(err) => {
                warn!(key, error = %err, "failed to serialize cache value");
                return;
            }
        };

        if let Err(err) = self.storage.set_item(&self.storage_key(key), &text) {
            warn!(key, error = %err, "failed to write cache record");
        }
    }
}

impl<V: DeserializeOwned, S: Storage> DurableCache<V, S> {
    // == Get ==
    /// Reads a value. Absent, unreadable and expired records are all misses;
    /// expired records are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let storage_key = self.storage_key(key);
        let raw = self.storage.get_item(&storage_key)?;

        let record: StoredRecord<V> = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(key, error = %err, "failed to parse cache record");
                return None;
            }
        };

        if record.is_expired_at(now_ms()) {
            debug!(key, "durable cache record expired");
            self.remove_physical(&storage_key);
            return None;
        }
        Some(record.value)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<V, S> Cache<V> for DurableCache<V, S>
where
    V: Serialize + DeserializeOwned,
    S: Storage,
{
    fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        DurableCache::set(self, key, &value, ttl);
    }

    fn get(&self, key: &str) -> Option<V> {
        DurableCache::get(self, key)
    }

    fn has(&self, key: &str) -> bool {
        DurableCache::has(self, key)
    }

    fn delete(&self, key: &str) {
        DurableCache::delete(self, key);
    }

    fn clear(&self) {
        DurableCache::clear(self);
    }
}
