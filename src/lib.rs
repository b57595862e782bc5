//! Campus Cache - client-side caching layer
//!
//! Provides bounded TTL, durable key/value and LRU caches behind one
//! `Cache` trait, plus memoization wrappers for async producers.

pub mod cache;
pub mod caches;
pub mod config;
pub mod error;
pub mod logging;
pub mod memoize;
pub mod storage;
pub mod tasks;

pub use cache::{Cache, CacheStats, DurableCache, LruCache, MemoryCache};
pub use caches::AppCaches;
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use memoize::{memoize, memoize_with, MemoizeOptions};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use tasks::spawn_purge_task;
