//! In-process storage medium.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Storage;
use crate::error::{CacheError, Result};

/// Shared in-memory key/value medium.
///
/// Clones share the same map, so a cache rebuilt over a clone sees earlier
/// writes, the same way a page reload sees browser-local storage. An optional
/// quota bounds the total bytes of keys plus values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium refusing writes that would exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Arc::default(),
            quota: Some(quota),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota {
            let used: usize = items.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
            let requested = used - replaced + key.len() + value.len();
            if requested > quota {
                return Err(CacheError::QuotaExceeded { requested, quota });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}
