//! Application cache set
//!
//! The host builds one `AppCaches` at startup and hands clones to the
//! components that need caching.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{DurableCache, LruCache, MemoryCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::storage::{MemoryStorage, Storage};
use crate::tasks::spawn_purge_task;

/// One instance of each cache, shared by reference.
///
/// Cloning is cheap: every field is an `Arc`.
#[derive(Debug)]
pub struct AppCaches<V, S = MemoryStorage> {
    pub memory: Arc<MemoryCache<V>>,
    pub durable: Arc<DurableCache<V, S>>,
    pub lru: Arc<LruCache<V>>,
}

impl<V, S> Clone for AppCaches<V, S> {
    fn clone(&self) -> Self {
        Self {
            memory: Arc::clone(&self.memory),
            durable: Arc::clone(&self.durable),
            lru: Arc::clone(&self.lru),
        }
    }
}

impl<V, S> AppCaches<V, S>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
    S: Storage + 'static,
{
    /// Validates the configuration and builds every cache from it.
    pub fn from_config(config: &CacheConfig, storage: S) -> Result<Self> {
        config.validate()?;

        let caches = Self {
            memory: Arc::new(MemoryCache::from_config(config)),
            durable: Arc::new(DurableCache::from_config(config, storage)),
            lru: Arc::new(LruCache::from_config(config)),
        };
        info!(
            "Caches initialized: max_size={}, default_ttl={}ms, lru_capacity={}, prefix={:?}",
            config.max_size, config.default_ttl_ms, config.lru_capacity, config.storage_prefix
        );
        Ok(caches)
    }

    /// Starts the periodic purge of the durable cache.
    pub fn spawn_purge_task(&self, config: &CacheConfig) -> JoinHandle<()> {
        spawn_purge_task(Arc::clone(&self.durable), config.purge_interval)
    }
}
