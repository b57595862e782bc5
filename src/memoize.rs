//! Memoization Module
//!
//! Wraps an async, fallible producer so repeated calls with equal arguments
//! are served from any [`Cache`] instead of recomputed.
//!
//! Concurrent calls for the same key are not coalesced: each one that misses
//! runs the producer.
//!
//! # Example
//! ```ignore
//! let store = Arc::new(MemoryCache::new(100, Duration::from_secs(60)));
//! let fetch_course = memoize("fetch_course", |id: u64| async move {
//!     api.course(id).await
//! }, store, None);
//! let course = fetch_course(42).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::Cache;

/// Maps call arguments to a cache key. None means "do not cache this call".
pub type KeyFn<A> = Arc<dyn Fn(&A) -> Option<String> + Send + Sync>;

// == Memoize Options ==
/// Key strategy and TTL for a memoized function.
pub struct MemoizeOptions<A> {
    name: String,
    key_fn: KeyFn<A>,
    ttl: Option<Duration>,
}

impl<A: Serialize + 'static> MemoizeOptions<A> {
    /// Keys calls as `"{name}:{arguments as JSON}"`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let prefix = name.clone();
        Self {
            name,
            key_fn: Arc::new(move |args: &A| match serde_json::to_string(args) {
                Ok(encoded) => Some(format!("{prefix}:{encoded}")),
                Err(err) => {
                    warn!(function = %prefix, error = %err, "arguments not serializable, skipping cache");
                    None
                }
            }),
            ttl: None,
        }
    }
}

impl<A: 'static> MemoizeOptions<A> {
    /// Keys calls with a caller-supplied function.
    pub fn keyed(
        name: impl Into<String>,
        key_fn: impl Fn(&A) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            key_fn: Arc::new(move |args: &A| Some(key_fn(args))),
            ttl: None,
        }
    }

    /// Replaces the key strategy, keeping name and TTL.
    pub fn with_key_fn(mut self, key_fn: impl Fn(&A) -> String + Send + Sync + 'static) -> Self {
        self.key_fn = Arc::new(move |args: &A| Some(key_fn(args)));
        self
    }

    /// TTL passed to the store on every write. None uses the store's default.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key a call with `args` would use.
    pub fn key_for(&self, args: &A) -> Option<String> {
        (self.key_fn)(args)
    }
}

// == Memoize ==
/// Wraps `producer` with the default key strategy.
///
/// Several arguments are passed as one tuple, e.g. `|(id, page): (u64, u32)|`.
pub fn memoize<A, V, E, F, Fut, C>(
    name: &str,
    producer: F,
    store: Arc<C>,
    ttl: Option<Duration>,
) -> impl Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync
where
    A: Serialize + Send + 'static,
    V: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    C: Cache<V> + ?Sized + 'static,
{
    let mut options = MemoizeOptions::new(name);
    options.ttl = ttl;
    memoize_with(producer, store, options)
}

/// Wraps `producer` using the given options.
///
/// On a hit the cached value is returned and the producer is not called.
/// On a miss the producer runs; `Ok` values are stored and returned, `Err`
/// values are returned unchanged and nothing is stored.
pub fn memoize_with<A, V, E, F, Fut, C>(
    producer: F,
    store: Arc<C>,
    options: MemoizeOptions<A>,
) -> impl Fn(A) -> BoxFuture<'static, Result<V, E>> + Send + Sync
where
    A: Send + 'static,
    V: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    C: Cache<V> + ?Sized + 'static,
{
    let producer = Arc::new(producer);
    let MemoizeOptions { name, key_fn, ttl } = options;
    let name: Arc<str> = name.into();

    move |args: A| -> BoxFuture<'static, Result<V, E>> {
        let producer = Arc::clone(&producer);
        let store = Arc::clone(&store);
        let name = Arc::clone(&name);
        let key = key_fn(&args);

        Box::pin(async move {
            let Some(key) = key else {
                return producer(args).await;
            };

            if let Some(cached) = store.get(&key) {
                debug!(function = %name, key = %key, "memoized hit");
                return Ok(cached);
            }

            let value = producer(args).await?;
            store.set(&key, value.clone(), ttl);
            debug!(function = %name, key = %key, "memoized result stored");
            Ok(value)
        })
    }
}
