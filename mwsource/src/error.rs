//! Error types for the provider adapters

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while talking to an upstream affiliate API
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP transport failure (connection refused, DNS, TLS...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream did not answer within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Credentials rejected (401/403)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Endpoint or resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Quota exceeded (429)
    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    /// Any other non-2xx answer
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// The body was valid JSON but the provider flagged the call as failed
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    /// The body did not have the expected shape
    #[error("Unexpected payload: {0}")]
    Payload(String),

    /// The body could not be decoded
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation is not offered by this provider
    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    /// Configuration error (from mwconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl SourceError {
    /// Builds an error from a non-2xx status code and the response body
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimited,
            _ => Self::Api {
                code,
                message: message.into(),
            },
        }
    }

    /// Maps a reqwest failure, singling out timeouts
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// True for failures caused by the network or the upstream service,
    /// as opposed to a local misconfiguration
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            SourceError::from_status_code(403, "denied"),
            SourceError::Unauthorized(_)
        ));
        assert!(matches!(
            SourceError::from_status_code(404, "nope"),
            SourceError::NotFound(_)
        ));
        assert!(matches!(
            SourceError::from_status_code(429, ""),
            SourceError::RateLimited
        ));
        match SourceError::from_status_code(500, "boom") {
            SourceError::Api { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_upstream() {
        assert!(SourceError::Timeout.is_upstream());
        assert!(!SourceError::Unsupported {
            provider: "AWE",
            operation: "videos"
        }
        .is_upstream());
    }
}
