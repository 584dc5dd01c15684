//! JSON response cache put in front of the upstream calls

use crate::key::{CacheKey, CacheTier};
use crate::memory::MemoryCacheStore;
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Optional store wrapper that never fails
///
/// Store errors are logged and turned into misses (reads) or no-ops
/// (writes): a broken cache slows requests down but never breaks them.
/// A disabled cache always misses.
///
/// # Exemple
///
/// ```rust,ignore
/// use mwcache::{CacheKey, CacheTier, ResponseCache};
///
/// let cache = ResponseCache::memory(1000);
/// let key = CacheKey::new("models").field("limit", 24);
/// if cache.get_json::<ModelPage>(&key).await.is_none() {
///     cache.put_json(&key, &page, CacheTier::Premium).await;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A cache that stores nothing
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// In-process cache holding at most `capacity` entries
    pub fn memory(capacity: u64) -> Self {
        Self::new(Arc::new(MemoryCacheStore::with_capacity(capacity)))
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Name of the backing store, `none` when disabled
    pub fn backend_name(&self) -> &'static str {
        self.store.as_ref().map_or("none", |s| s.name())
    }

    /// Reads the raw blob stored under `key`
    pub async fn get_raw(&self, key: &CacheKey) -> Option<String> {
        let store = self.store.as_ref()?;
        let rendered = key.render();

        match store.get(&rendered).await {
            Ok(Some(value)) => {
                debug!(backend = store.name(), "Cache hit: {}", rendered);
                Some(value)
            }
            Ok(None) => {
                debug!(backend = store.name(), "Cache miss: {}", rendered);
                None
            }
            Err(e) => {
                warn!(backend = store.name(), "Cache read failed for {}: {}", rendered, e);
                None
            }
        }
    }

    /// Stores a raw blob for the TTL of `tier`
    pub async fn put_raw(&self, key: &CacheKey, value: String, tier: CacheTier) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let rendered = key.render();

        if let Err(e) = store.set(&rendered, value, tier.ttl()).await {
            warn!(backend = store.name(), "Cache write failed for {}: {}", rendered, e);
        }
    }

    /// Reads and decodes a JSON value; an undecodable blob counts as a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Encodes and stores a JSON value
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T, tier: CacheTier) {
        match serde_json::to_string(value) {
            Ok(raw) => self.put_raw(key, raw, tier).await,
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Drops every entry, when the store supports it
    pub async fn clear(&self) {
        if let Some(store) = self.store.as_ref() {
            if let Err(e) = store.clear().await {
                warn!(backend = store.name(), "Cache clear failed: {}", e);
            }
        }
    }
}
