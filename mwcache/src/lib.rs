//! # mwcache - Response cache for MistressWorld
//!
//! Upstream listings are cached as serialized JSON blobs for a short, fixed
//! time depending on their [`CacheTier`]:
//!
//! | Tier       | TTL   |
//! |------------|-------|
//! | `Free`     | 120 s |
//! | `Premium`  | 180 s |
//! | `Taxonomy` | 300 s |
//!
//! Backends implement [`CacheStore`]: [`MemoryCacheStore`] (moka, always
//! available) and `RedisCacheStore` (feature `redis`). [`ResponseCache`] wraps
//! an optional store and swallows its errors.

pub mod config_ext;
pub mod error;
pub mod key;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod response;
pub mod store;

pub use config_ext::{CacheBackend, CacheConfigExt};
pub use error::{CacheError, Result};
pub use key::{CacheKey, CacheTier};
pub use memory::MemoryCacheStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisCacheStore;
pub use response::ResponseCache;
pub use store::CacheStore;
