//! Cache Module
//!
//! Provides the three interchangeable key/value caches:
//! - `MemoryCache`: bounded, per-entry TTL, insertion-order eviction
//! - `DurableCache`: persisted in a `Storage` medium, namespaced by prefix
//! - `LruCache`: fixed capacity, least-recently-used eviction

mod durable;
mod entry;
mod lru;
mod lru_cache;
mod memory;
mod stats;


use std::time::Duration;

// Re-export public types
pub use durable::DurableCache;
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use lru_cache::LruCache;
pub use memory::MemoryCache;
pub use stats::CacheStats;

// == Cache Trait ==
/// The key/value contract shared by every cache.
///
/// A missing, expired or unreadable entry is `None`. `ttl: None` means the
/// cache's default; caches without expiry ignore it.
pub trait Cache<V>: Send + Sync {
    fn set(&self, key: &str, value: V, ttl: Option<Duration>);
    fn get(&self, key: &str) -> Option<V>;
    fn has(&self, key: &str) -> bool;
    fn delete(&self, key: &str);
    fn clear(&self);
}
