//! Error types for REST API operations

use bullish_auth::AuthError;
use bullish_types::{ClassifiedError, ErrorKind, RecoveryStrategy};

use crate::transport::TransportError;

/// Errors that can occur during REST API operations
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The transport could not complete the call
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Credential or login failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Venue error body, mapped onto a canonical kind
    #[error(transparent)]
    Exchange(#[from] ClassifiedError),

    /// Non-2xx response the classifier could not interpret
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl RestError {
    /// Canonical kind, when the error came from the venue
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Exchange(err) => Some(err.kind),
            _ => None,
        }
    }

    /// Get the recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            Self::Exchange(err) => err.recovery_strategy(),
            Self::Transport(_) => RecoveryStrategy::Retry {
                max_attempts: 3,
                delay_ms: 1000,
            },
            Self::Http { status, .. } if *status >= 500 => RecoveryStrategy::service_retry(),
            Self::Http { status: 429, .. } => RecoveryStrategy::Backoff {
                initial_ms: 1000,
                max_ms: 10_000,
                multiplier: 2,
            },
            Self::Http { .. } => RecoveryStrategy::Manual,
            Self::Auth(AuthError::AuthenticationFailed { .. }) => RecoveryStrategy::Reauthenticate,
            Self::Auth(_) | Self::Parse(_) | Self::InvalidParameter(_) => RecoveryStrategy::Fatal,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.recovery_strategy().allows_retry()
    }

    /// Check if the cached session should be dropped
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Exchange(err) => err.kind.is_auth_error(),
            Self::Auth(AuthError::AuthenticationFailed { .. }) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;
