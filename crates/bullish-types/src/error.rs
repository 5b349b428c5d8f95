//! Classified venue errors

use serde_json::Value;
use thiserror::Error;

use crate::error_codes::{ErrorKind, MatchStage, RecoveryStrategy, VENUE_ID};

/// A venue error body mapped onto a canonical [`ErrorKind`]
///
/// Returned in place of a successful parse. The raw payload is kept
/// verbatim for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: bullish {raw_payload}")]
pub struct ClassifiedError {
    /// Canonical kind
    pub kind: ErrorKind,
    /// `errorCode` (or `errorCodeName`) as reported by the venue
    pub venue_code: Option<String>,
    /// `message` as reported by the venue (empty if absent)
    pub venue_message: String,
    /// Classifier step that produced `kind`
    pub stage: MatchStage,
    /// Decoded response body
    pub raw_payload: Value,
}

impl ClassifiedError {
    /// Venue id followed by the raw body
    pub fn feedback(&self) -> String {
        format!("{} {}", VENUE_ID, self.raw_payload)
    }

    /// Get the recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        self.kind.recovery_strategy()
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.recovery_strategy().allows_retry()
    }

    /// Check if this error requires logging in again
    pub fn requires_reauth(&self) -> bool {
        matches!(self.recovery_strategy(), RecoveryStrategy::Reauthenticate)
    }
}
