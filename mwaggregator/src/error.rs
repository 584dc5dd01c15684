//! Error types for the orchestrator and the HTTP layer

use mwsource::{ProviderKind, SourceError};

/// Result type alias for aggregation operations
pub type Result<T> = std::result::Result<T, AggregatorError>;

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// `provider` query parameter outside awe|vpapi|free
    #[error("Unknown provider '{0}' (expected awe, vpapi or free)")]
    UnknownProvider(String),

    /// A query parameter could not be coerced
    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: String, value: String },

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    /// No adapter registered for this provider
    #[error("Provider {0} is not available")]
    ProviderUnavailable(ProviderKind),

    /// A single adapter failed
    #[error("{provider} request failed: {source}")]
    Upstream {
        provider: ProviderKind,
        #[source]
        source: SourceError,
    },

    /// Every adapter of a fan-out failed
    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),
}

impl AggregatorError {
    pub fn invalid(name: &str, value: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// True when the caller sent a bad request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider(_) | Self::InvalidParameter { .. } | Self::UnknownCategory(_)
        )
    }
}
