//! Integration tests for the response cache

use mwcache::{CacheError, CacheKey, CacheStore, CacheTier, MemoryCacheStore, ResponseCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Page {
    items: Vec<String>,
    total: u64,
}

fn page() -> Page {
    Page {
        items: vec!["luna".to_string(), "jade".to_string()],
        total: 2,
    }
}

/// A store whose every operation fails
#[derive(Debug)]
struct BrokenStore;

#[async_trait::async_trait]
impl CacheStore for BrokenStore {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> mwcache::Result<Option<String>> {
        Err(CacheError::Backend("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> mwcache::Result<()> {
        Err(CacheError::Timeout)
    }
}

#[tokio::test]
async fn test_round_trip_is_byte_identical() {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = ResponseCache::new(store.clone());
    let key = CacheKey::new("models")
        .field("provider", "awe")
        .field("limit", 24);

    cache.put_json(&key, &page(), CacheTier::Premium).await;

    let raw = store.get(&key.render()).await.unwrap().unwrap();
    assert_eq!(raw, serde_json::to_string(&page()).unwrap());
    assert_eq!(cache.get_raw(&key).await.as_deref(), Some(raw.as_str()));
    assert_eq!(cache.get_json::<Page>(&key).await, Some(page()));

    // same fields, other insertion order
    let same = CacheKey::new("models")
        .field("limit", 24)
        .field("provider", "awe");
    assert_eq!(cache.get_json::<Page>(&same).await, Some(page()));
}

#[tokio::test]
async fn test_miss_after_expiry() {
    let store = MemoryCacheStore::new();
    let key = CacheKey::new("free-models").field("limit", 10).render();

    store
        .set(&key, "[1,2,3]".to_string(), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("[1,2,3]"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn test_disabled_cache_always_misses() {
    let cache = ResponseCache::disabled();
    let key = CacheKey::new("categories");

    cache.put_json(&key, &page(), CacheTier::Taxonomy).await;
    assert!(cache.get_json::<Page>(&key).await.is_none());
    assert!(!cache.is_enabled());
}

#[tokio::test]
async fn test_store_errors_degrade_to_misses() {
    let cache = ResponseCache::new(Arc::new(BrokenStore));
    let key = CacheKey::new("videos");

    cache.put_json(&key, &page(), CacheTier::Premium).await;
    assert!(cache.get_json::<Page>(&key).await.is_none());
    // unsupported clear is logged, not raised
    cache.clear().await;
}

#[tokio::test]
async fn test_undecodable_entry_is_a_miss() {
    let store = Arc::new(MemoryCacheStore::new());
    let cache = ResponseCache::new(store.clone());
    let key = CacheKey::new("models");

    store
        .set(&key.render(), "not json".to_string(), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(cache.get_json::<Page>(&key).await.is_none());
    assert_eq!(cache.get_raw(&key).await.as_deref(), Some("not json"));
}
