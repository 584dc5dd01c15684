//! Error types for the cache layer

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backing store failed (connection, command...)
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// The backing store did not answer in time
    #[error("Cache operation timed out")]
    Timeout,

    /// The operation is not offered by this store
    #[error("Operation not supported by the {0} store")]
    Unsupported(&'static str),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Backend(err.to_string())
        }
    }
}
