//! Extension pour lire la configuration du cache depuis mwconfig
//!
//! ```yaml
//! cache:
//!   backend: memory   # memory | redis | none
//!   capacity: 10000
//!   redis_url: "redis://127.0.0.1/"
//!   key_prefix: "mistressworld"
//! ```

use crate::memory::DEFAULT_CAPACITY;
use crate::response::ResponseCache;
use anyhow::{anyhow, Result};
use mwconfig::Config;
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

const DEFAULT_KEY_PREFIX: &str = "mistressworld";

/// Selectable cache backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
    None,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "moka" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            "none" | "off" | "disabled" => Ok(CacheBackend::None),
            other => Err(anyhow!("Unknown cache backend '{}'", other)),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
            CacheBackend::None => "none",
        })
    }
}

/// Trait d'extension pour la configuration du cache
pub trait CacheConfigExt {
    /// Backend selected by `cache.backend`; unknown values fall back to memory
    fn get_cache_backend(&self) -> CacheBackend;

    fn set_cache_backend(&self, backend: CacheBackend) -> Result<()>;

    /// Maximum number of in-memory entries
    fn get_cache_capacity(&self) -> u64;

    fn get_cache_redis_url(&self) -> Option<String>;

    /// Namespace prepended to shared-store keys
    fn get_cache_key_prefix(&self) -> String;

    /// Builds the response cache described by the configuration
    fn build_response_cache(&self) -> Result<ResponseCache>;
}

impl CacheConfigExt for Config {
    fn get_cache_backend(&self) -> CacheBackend {
        match self.get_string(&["cache", "backend"]) {
            Some(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}, using the memory cache", e);
                CacheBackend::Memory
            }),
            None => CacheBackend::Memory,
        }
    }

    fn set_cache_backend(&self, backend: CacheBackend) -> Result<()> {
        self.set_value(&["cache", "backend"], Value::String(backend.to_string()))
    }

    fn get_cache_capacity(&self) -> u64 {
        self.get_u64(&["cache", "capacity"])
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_CAPACITY)
    }

    fn get_cache_redis_url(&self) -> Option<String> {
        self.get_string(&["cache", "redis_url"])
    }

    fn get_cache_key_prefix(&self) -> String {
        self.get_string(&["cache", "key_prefix"])
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string())
    }

    fn build_response_cache(&self) -> Result<ResponseCache> {
        let cache = match self.get_cache_backend() {
            CacheBackend::None => ResponseCache::disabled(),
            CacheBackend::Memory => ResponseCache::memory(self.get_cache_capacity()),
            CacheBackend::Redis => redis_cache(self),
        };
        info!("Response cache backend: {}", cache.backend_name());
        Ok(cache)
    }
}

#[cfg(feature = "redis")]
fn redis_cache(config: &Config) -> ResponseCache {
    let Some(url) = config.get_cache_redis_url() else {
        warn!("cache.backend is redis but cache.redis_url is not set, using the memory cache");
        return ResponseCache::memory(config.get_cache_capacity());
    };

    match crate::redis_store::RedisCacheStore::new(&url, &config.get_cache_key_prefix()) {
        Ok(store) => ResponseCache::new(std::sync::Arc::new(store)),
        Err(e) => {
            warn!("Cannot use redis cache at '{}': {}, using the memory cache", url, e);
            ResponseCache::memory(config.get_cache_capacity())
        }
    }
}

#[cfg(not(feature = "redis"))]
fn redis_cache(config: &Config) -> ResponseCache {
    warn!("Built without the redis feature, using the memory cache");
    ResponseCache::memory(config.get_cache_capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, yaml: &str) -> Config {
        std::fs::write(dir.path().join("config.yaml"), yaml).unwrap();
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Memory".parse::<CacheBackend>().unwrap(), CacheBackend::Memory);
        assert_eq!("none".parse::<CacheBackend>().unwrap(), CacheBackend::None);
        assert!("memcached".parse::<CacheBackend>().is_err());
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, "{}\n");

        assert_eq!(config.get_cache_backend(), CacheBackend::Memory);
        assert_eq!(config.get_cache_capacity(), 10_000);
        assert_eq!(config.get_cache_key_prefix(), "mistressworld");
        assert!(config.get_cache_redis_url().is_none());
        assert!(config.build_response_cache().unwrap().is_enabled());
    }

    #[test]
    fn test_disabled_backend() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, "cache:\n  backend: none\n");

        let cache = config.build_response_cache().unwrap();
        assert!(!cache.is_enabled());
        assert_eq!(cache.backend_name(), "none");

        config.set_cache_backend(CacheBackend::Memory).unwrap();
        assert_eq!(config.get_cache_backend(), CacheBackend::Memory);
    }

    #[test]
    fn test_unusable_redis_falls_back_to_memory() {
        for yaml in [
            "cache:\n  backend: redis\n",
            "cache:\n  backend: redis\n  redis_url: \"\"\n",
            "cache:\n  backend: redis\n  redis_url: \"not a redis url\"\n",
        ] {
            let dir = TempDir::new().unwrap();
            let config = config_in(&dir, yaml);

            let cache = config.build_response_cache().unwrap();
            assert!(cache.is_enabled(), "{yaml}");
            assert_eq!(cache.backend_name(), "memory", "{yaml}");
        }
    }
}
