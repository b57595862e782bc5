//! Cache Entry Module
//!
//! Defines the structure for individual in-memory cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was written
    pub stored_at: Instant,
    /// Time to live, `Duration::ZERO` = no expiration
    pub ttl: Duration,
    /// Write stamp, unique per cache, used to match expiry timers to entries
    pub(crate) generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stored now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time to live, zero for an entry that never expires
    /// * `generation` - Write stamp assigned by the owning cache
    pub fn new(value: V, ttl: Duration, generation: u64) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
            generation,
        }
    }

    // == Is Expired ==
    /// Checks expiry against a given instant.
    ///
    /// Boundary condition: an entry read exactly `ttl` after it was stored is
    /// still live; it expires once strictly more than `ttl` has elapsed.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        !self.ttl.is_zero() && now.saturating_duration_since(self.stored_at) > self.ttl
    }
}
