//! Backend abstraction

use crate::error::{CacheError, Result};
use std::fmt::Debug;
use std::time::Duration;

/// A string key/value store with per-entry expiry
///
/// Values are opaque serialized blobs. A value written under a key must be
/// returned byte-identical until its TTL elapses, and never after.
#[async_trait::async_trait]
pub trait CacheStore: Debug + Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Reads a value, `None` on a miss or after expiry
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value that expires after `ttl`
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Drops every entry
    async fn clear(&self) -> Result<()> {
        Err(CacheError::Unsupported(self.name()))
    }
}
