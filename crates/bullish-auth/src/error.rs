//! Error types for authentication operations

use serde_json::Value;

/// Errors that can occur during authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A private call was attempted on a client built without credentials
    #[error("Credentials are required for this endpoint")]
    MissingCredentials,

    /// The login handshake returned no usable token
    #[error("Login unsuccessful: {reason}")]
    AuthenticationFailed {
        /// What was wrong with the response
        reason: String,
        /// Decoded login response, kept for diagnostics
        raw: Value,
    },

    /// Invalid API credentials
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),
}

impl AuthError {
    /// Create a login failure carrying the raw response
    pub fn authentication_failed(reason: impl Into<String>, raw: Value) -> Self {
        Self::AuthenticationFailed {
            reason: reason.into(),
            raw,
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
