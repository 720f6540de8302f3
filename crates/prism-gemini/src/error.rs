//! Error types for the gateway crate.

use thiserror::Error;

/// Result type alias using the gateway error type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors from Gemini API calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// API error reported by the provider.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network/connectivity error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error (missing model, bad base URL, etc.).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A single-shot generation returned no usable payload.
    #[error("No {what} generated")]
    EmptyResponse { what: &'static str },

    /// A long-running operation handle was not found by the provider.
    ///
    /// Surfaced distinctly because it usually means the credential the
    /// operation was started under has expired or changed; callers should
    /// run a credential-reselection flow rather than fail hard.
    #[error("operation '{0}' not found (credential may have expired)")]
    OperationNotFound(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl GatewayError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..600).contains(&(*status as u32)),
            _ => false,
        }
    }

    /// Returns true if this error should trigger credential reselection.
    pub fn is_credential_expired(&self) -> bool {
        matches!(self, Self::OperationNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_server_errors_are_retryable() {
        assert!(GatewayError::Network("reset".into()).is_retryable());
        assert!(
            GatewayError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_retryable()
        );
        assert!(
            GatewayError::Api {
                status: 429,
                message: "slow down".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn auth_and_not_found_are_not_retryable() {
        assert!(!GatewayError::Auth("bad key".into()).is_retryable());
        assert!(!GatewayError::OperationNotFound("op/1".into()).is_retryable());
    }

    #[test]
    fn only_operation_not_found_expires_credentials() {
        assert!(GatewayError::OperationNotFound("op/1".into()).is_credential_expired());
        assert!(
            !GatewayError::Api {
                status: 404,
                message: "no model".into()
            }
            .is_credential_expired()
        );
    }
}
