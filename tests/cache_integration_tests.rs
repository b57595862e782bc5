//! Integration Tests for the public cache API
//!
//! Exercises the caches the way a host application does: built once from
//! configuration, shared by reference, and used through memoized fetchers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use campus_cache::{
    memoize, memoize_with, AppCaches, Cache, CacheConfig, DurableCache, FileStorage, LruCache,
    MemoizeOptions, MemoryCache, MemoryStorage, Storage,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// == Helper Types ==

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Course {
    id: u64,
    title: String,
    credits: u8,
}

fn course(id: u64) -> Course {
    Course {
        id,
        title: format!("Course {id}"),
        credits: 3,
    }
}

// == Bounded TTL Cache ==

#[tokio::test(start_paused = true)]
async fn test_memory_cache_expiry() {
    let cache = MemoryCache::new(10, Duration::from_secs(300));

    cache.set("k", "v".to_string(), Some(Duration::from_millis(100)));
    assert_eq!(cache.get("k"), Some("v".to_string()));

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get("k"), None);
    assert!(!cache.has("k"));
}

#[test]
fn test_memory_cache_insertion_order_eviction() {
    let cache = MemoryCache::new(2, Duration::ZERO);

    cache.set("a", 1, None);
    cache.set("b", 2, None);
    cache.set("c", 3, None);

    assert!(!cache.has("a"));
    assert!(cache.has("b"));
    assert!(cache.has("c"));
}

// == LRU Cache ==

#[test]
fn test_lru_cache_eviction_order() {
    let cache = LruCache::new(2);

    cache.set("a", 1);
    cache.set("b", 2);
    cache.get("a");
    cache.set("c", 3);

    assert!(!cache.has("b"));
    assert!(cache.has("a"));
    assert!(cache.has("c"));
}

// == Durable Cache ==

#[test]
fn test_durable_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local-storage.json");

    {
        let storage = FileStorage::open(&path).unwrap();
        let cache: DurableCache<Value, FileStorage> = DurableCache::new(storage, "cache_");
        cache.set("x", &json!({"a": 1}), None);
    }

    // Simulated reload: new medium handle, new cache, same prefix
    let storage = FileStorage::open(&path).unwrap();
    let cache: DurableCache<Value, FileStorage> = DurableCache::new(storage, "cache_");

    assert_eq!(cache.get("x"), Some(json!({"a": 1})));
}

#[test]
fn test_durable_typed_values() {
    let storage = MemoryStorage::new();
    let cache: DurableCache<Course> = DurableCache::new(storage.clone(), "courses_");

    cache.set("101", &course(101), None);

    let reloaded: DurableCache<Course> = DurableCache::new(storage, "courses_");
    assert_eq!(reloaded.get("101"), Some(course(101)));
}

#[test]
fn test_durable_prefix_isolation() {
    let storage = MemoryStorage::new();
    let a: DurableCache<u32> = DurableCache::new(storage.clone(), "a_");
    let b: DurableCache<u32> = DurableCache::new(storage.clone(), "b_");

    a.set("shared", &1, None);
    b.set("shared", &2, None);
    a.clear();

    assert!(!a.has("shared"));
    assert_eq!(b.get("shared"), Some(2));
    assert_eq!(storage.keys(), vec!["b_shared".to_string()]);
}

#[test]
fn test_durable_corrupt_record_is_a_miss() {
    let storage = MemoryStorage::new();
    let cache: DurableCache<u32> = DurableCache::new(storage.clone(), "cache_");
    storage.set_item("cache_broken", "{\"value\":").unwrap();

    assert_eq!(cache.get("broken"), None);

    cache.set("broken", &5, None);
    assert_eq!(cache.get("broken"), Some(5));
}

// == Interchangeable stores ==

fn exercise(store: &dyn Cache<u32>) {
    store.set("one", 1, None);
    store.set("two", 2, None);
    assert_eq!(store.get("one"), Some(1));
    assert!(store.has("two"));

    store.delete("one");
    assert_eq!(store.get("one"), None);

    store.clear();
    assert!(!store.has("two"));
}

#[test]
fn test_all_caches_share_one_contract() {
    exercise(&MemoryCache::new(10, Duration::ZERO));
    exercise(&LruCache::new(10));
    exercise(&DurableCache::<u32>::new(MemoryStorage::new(), "contract_"));
}

// == Memoization ==

#[tokio::test]
async fn test_memoize_idempotence_on_every_store() {
    let stores: Vec<Arc<dyn Cache<usize>>> = vec![
        Arc::new(MemoryCache::new(10, Duration::from_secs(60))),
        Arc::new(LruCache::new(10)),
        Arc::new(DurableCache::<usize>::new(MemoryStorage::new(), "memo_")),
    ];

    for store in stores {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let producer = move |_id: u64| {
            let counter = Arc::clone(&counter);
            async move { Ok::<_, anyhow::Error>(counter.fetch_add(1, Ordering::SeqCst) + 1) }
        };
        let wrapped = memoize("fetch", producer, store, None);

        let first = wrapped(7).await.unwrap();
        let second = wrapped(7).await.unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_memoize_with_custom_key_over_durable_store() {
    let storage = MemoryStorage::new();
    let store: Arc<DurableCache<Course>> = Arc::new(DurableCache::new(storage.clone(), "api_"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let fetch_course = move |(id, _page): (u64, u32)| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(course(id))
        }
    };
    // The page argument does not affect the result, so it is left out of the key
    let options = MemoizeOptions::keyed("course", |(id, _page): &(u64, u32)| format!("course:{id}"))
        .with_ttl(Duration::from_secs(60));
    let wrapped = memoize_with(fetch_course, store, options);

    assert_eq!(wrapped((3, 1)).await.unwrap(), course(3));
    assert_eq!(wrapped((3, 2)).await.unwrap(), course(3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(storage.get_item("api_course:3").is_some());
}

#[tokio::test]
async fn test_memoize_producer_failure_passes_through() {
    let store = Arc::new(LruCache::new(10));
    let wrapped = memoize(
        "always_fails",
        |_id: u64| async move { Err::<u32, _>(anyhow::anyhow!("timeout")) },
        store.clone(),
        None,
    );

    let err = wrapped(1).await.unwrap_err();

    assert_eq!(err.to_string(), "timeout");
    assert!(store.is_empty());
}

// == Application cache set ==

#[tokio::test]
async fn test_app_caches_from_config() {
    let config = CacheConfig {
        max_size: 2,
        lru_capacity: 2,
        storage_prefix: "campus_".to_string(),
        ..CacheConfig::default()
    };
    let storage = MemoryStorage::new();
    let caches: AppCaches<Value> = AppCaches::from_config(&config, storage.clone()).unwrap();
    let purge_handle = caches.spawn_purge_task(&config);

    let shared = caches.clone();
    shared.memory.set("a", json!(1), None);
    shared.lru.set("b", json!(2));
    shared.durable.set("c", &json!(3), None);

    assert_eq!(caches.memory.get("a"), Some(json!(1)));
    assert_eq!(caches.lru.get("b"), Some(json!(2)));
    assert_eq!(caches.durable.get("c"), Some(json!(3)));
    assert_eq!(storage.keys(), vec!["campus_c".to_string()]);

    purge_handle.abort();
}
