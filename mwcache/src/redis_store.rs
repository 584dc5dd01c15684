//! Shared store backed by Redis (`GET` / `SET EX`)

use crate::error::{CacheError, Result};
use crate::store::CacheStore;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Default budget for a single Redis command
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

/// Redis store; every key is namespaced by `prefix`
#[derive(Clone)]
pub struct RedisCacheStore {
    client: redis::Client,
    prefix: String,
    timeout: Duration,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RedisCacheStore {
    /// Opens a client for `url`; no connection is made until the first command
    pub fn new(url: &str, prefix: &str) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
            prefix: prefix.trim_end_matches(':').to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.prefix)
        }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.timeout, op).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cache_key = self.full_key(key);
        self.bounded(async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let value: Option<String> = conn.get(cache_key).await?;
            Ok::<_, redis::RedisError>(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let cache_key = self.full_key(key);
        let secs = ttl.as_secs().max(1);
        self.bounded(async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(cache_key, value, secs).await?;
            Ok::<_, redis::RedisError>(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        let store = RedisCacheStore::new("redis://127.0.0.1/", "mw:").unwrap();
        assert_eq!(store.full_key("models:{}"), "mw:models:{}");

        let bare = RedisCacheStore::new("redis://127.0.0.1/", "").unwrap();
        assert_eq!(bare.full_key("k"), "k");
    }

    #[test]
    fn test_invalid_url() {
        assert!(RedisCacheStore::new("not a url", "mw").is_err());
    }
}
