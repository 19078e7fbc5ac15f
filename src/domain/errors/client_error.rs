//! Chat client error types.

use thiserror::Error;

/// Errors surfaced by the chat client port.
#[derive(Debug, Clone, Error)]
#[allow(missing_docs)]
pub enum ClientError {
    #[error("token rejected by Discord")]
    Unauthorized,

    #[error("access denied: {message}")]
    Forbidden { message: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("rate limited by Discord, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("unexpected client error: {message}")]
    Unexpected { message: String },
}

impl ClientError {
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether retrying the same request later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(ClientError::network("timeout").is_recoverable());
        assert!(ClientError::RateLimited { retry_after_ms: 10 }.is_recoverable());
        assert!(!ClientError::Unauthorized.is_recoverable());
        assert!(!ClientError::not_found("channel 1").is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClientError::not_found("channel 1").to_string(),
            "channel 1 not found"
        );
    }
}
