//! Bullish API error classification with recovery strategies
//!
//! Failed calls come back as a JSON body with an `errorCode` and a
//! `message`. [`classify`] maps such a body onto a canonical [`ErrorKind`]
//! in a fixed order:
//!
//! 1. skip if neither field is present
//! 2. exact match of `message` against [`EXACT_ERRORS`]
//! 3. exact match of the code against [`EXACT_ERRORS`]
//! 4. substring match of `message` against [`BROAD_ERRORS`]
//! 5. generic [`ErrorKind::ExchangeError`]
//!
//! Broad matching must only run after both exact lookups, otherwise a
//! catch-all phrase such as `UNKNOWN` would shadow `UNKNOWN_ORDER`.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::ClassifiedError;

/// Identifier prefixed to generic venue errors
pub const VENUE_ID: &str = "bullish";

/// Recovery strategy for handling API errors
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecoveryStrategy {
    /// Exponential backoff before retry
    Backoff {
        initial_ms: u64,
        max_ms: u64,
        multiplier: u32,
    },
    /// Fixed delay retry
    Retry { delay_ms: u64, max_attempts: u32 },
    /// Log in again (session token rejected)
    Reauthenticate,
    /// Cannot recover programmatically
    Fatal,
    /// Requires user intervention (e.g., add funds)
    UserAction { message: &'static str },
    /// Fix the request and resubmit
    Skip,
    /// Manual investigation needed
    #[default]
    Manual,
}

impl RecoveryStrategy {
    /// Default retry for transient service errors
    pub fn service_retry() -> Self {
        Self::Retry {
            delay_ms: 5000,
            max_attempts: 3,
        }
    }

    /// Get the initial delay duration
    pub fn initial_delay(&self) -> Option<Duration> {
        match self {
            Self::Backoff { initial_ms, .. } => Some(Duration::from_millis(*initial_ms)),
            Self::Retry { delay_ms, .. } => Some(Duration::from_millis(*delay_ms)),
            _ => None,
        }
    }

    /// Check if this strategy allows retry
    pub fn allows_retry(&self) -> bool {
        matches!(
            self,
            Self::Backoff { .. } | Self::Retry { .. } | Self::Reauthenticate
        )
    }
}

/// Canonical error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Session missing, expired, or the user is unknown
    AuthenticationError,
    /// Credentials lack the rights for this operation
    PermissionDenied,
    /// Malformed or rejected request parameters
    BadRequest,
    /// Market not supported
    BadSymbol,
    /// Fill-or-kill order could not be filled
    OrderNotFillable,
    /// Order id does not exist
    OrderNotFound,
    /// Not enough balance or margin
    InsufficientFunds,
    /// Venue offline
    ExchangeNotAvailable,
    /// Anything the tables do not cover
    ExchangeError,
}

impl ErrorKind {
    /// Name of the kind as shown to callers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationError => "AuthenticationError",
            Self::PermissionDenied => "PermissionDenied",
            Self::BadRequest => "BadRequest",
            Self::BadSymbol => "BadSymbol",
            Self::OrderNotFillable => "OrderNotFillable",
            Self::OrderNotFound => "OrderNotFound",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::ExchangeNotAvailable => "ExchangeNotAvailable",
            Self::ExchangeError => "ExchangeError",
        }
    }

    /// Get the recovery strategy for this kind
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            Self::AuthenticationError => RecoveryStrategy::Reauthenticate,
            Self::PermissionDenied => RecoveryStrategy::Fatal,
            Self::BadRequest | Self::BadSymbol | Self::OrderNotFound => RecoveryStrategy::Skip,
            Self::OrderNotFillable => RecoveryStrategy::UserAction {
                message: "Not enough liquidity to fill the order - adjust price or quantity",
            },
            Self::InsufficientFunds => RecoveryStrategy::UserAction {
                message: "Insufficient funds - deposit more or reduce order size",
            },
            Self::ExchangeNotAvailable => RecoveryStrategy::service_retry(),
            Self::ExchangeError => RecoveryStrategy::Manual,
        }
    }

    /// Check if this is an authentication-related error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthenticationError | Self::PermissionDenied)
    }

    /// Check if this is a trading-related error
    pub fn is_trading_error(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFillable | Self::OrderNotFound | Self::InsufficientFunds
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which step of the classifier produced the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStage {
    /// `message` matched an exact entry
    ExactMessage,
    /// `errorCode` (or `errorCodeName`) matched an exact entry
    ExactCode,
    /// `message` contained a broad entry
    BroadMessage,
    /// Nothing matched; generic exchange error
    Fallback,
}

/// Verbatim venue codes and messages
pub const EXACT_ERRORS: &[(&str, ErrorKind)] = &[
    ("EXCHANGE_OFFLINE", ErrorKind::ExchangeNotAvailable),
    ("INVALID_ORDERBOOK_REQUEST", ErrorKind::BadRequest),
    ("MISSING_ORDER_ID", ErrorKind::BadRequest),
    ("INVALID_CANDLE_REQUEST", ErrorKind::BadRequest),
    ("MARKET_NOT_SUPPORTED", ErrorKind::BadSymbol),
    ("CLIENT_NOT_LOGGED_IN", ErrorKind::AuthenticationError),
    ("EosUserNotExistsException", ErrorKind::AuthenticationError),
    ("QUANTITY_REMAINING__FOK_LIMIT_ORDER", ErrorKind::OrderNotFillable),
    ("QUANTITY_MUST_BE_POSITIVE", ErrorKind::BadRequest),
    ("PRICE_MUST_BE_POSITIVE", ErrorKind::BadRequest),
    ("ORDER_SIZE_OUTSIDE_VALID_RANGE", ErrorKind::BadRequest),
    ("ACCOUNT_MISMATCH", ErrorKind::BadRequest),
    ("CONFLICTING_ORDER_FLAGS", ErrorKind::BadRequest),
    ("OPEN_ORDER_COUNT_BREACH", ErrorKind::BadRequest),
    ("STRICTLY_INCREASING_ORDER_ID", ErrorKind::BadRequest),
    ("DUPLICATE_ORDER_ID", ErrorKind::BadRequest),
    ("NOT_ENOUGH_FUNDS__BUY_LIMIT_ORDER", ErrorKind::InsufficientFunds),
    ("NOT_ENOUGH_FUNDS__SELL_LIMIT_ORDER", ErrorKind::InsufficientFunds),
    ("DUPLICATE_ORDER", ErrorKind::BadRequest),
    ("UNKNOWN_ORDER", ErrorKind::OrderNotFound),
    ("MMS_INSUFFICIENT_BALANCE", ErrorKind::InsufficientFunds),
    ("MMS_24_HOUR_SUBMISSION_BREACH", ErrorKind::BadRequest),
    ("MMS_UPDATE_LARGER_THAN_SELL_AMOUNT", ErrorKind::BadRequest),
    ("PRICE_MUST_BE_OF_TICK_SIZE", ErrorKind::BadRequest),
    ("INSUFFICIENT_AVAILABLE_BALANCE", ErrorKind::InsufficientFunds),
    ("MMS_UNKNOWN_ORDER", ErrorKind::BadRequest),
    ("MARGIN_ACCOUNT_INSUFFICIENT_BALANCE", ErrorKind::InsufficientFunds),
    ("UNKNOWN_ACCOUNT", ErrorKind::BadRequest),
    ("ORDER_COMMAND_IGNORED", ErrorKind::BadRequest),
    ("NO_MARGIN_ACCOUNT", ErrorKind::InsufficientFunds),
    ("TRANSACTION_REFERENCE_BLOCK_MISMATCH", ErrorKind::BadRequest),
    ("NOT_ENOUGH_FUNDS__BUY_MARGIN_ORDER", ErrorKind::InsufficientFunds),
    ("NOT_ENOUGH_FUNDS__SELL_MARGIN_ORDER", ErrorKind::InsufficientFunds),
    ("BAD_PRICE_OR_QUANTITY", ErrorKind::BadRequest),
];

/// Catch-all fragments that are not stable verbatim strings. Checked in order.
pub const BROAD_ERRORS: &[(&str, ErrorKind)] = &[
    ("UNKNOWN", ErrorKind::ExchangeError),
    ("MALFORMED_ORDER", ErrorKind::BadRequest),
];

/// Outcome of running the classifier over a decoded error body
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The body carries neither `errorCode` nor `message`; the caller falls
    /// back to its transport-level error
    Unclassified,
    /// The body mapped onto a canonical kind
    Classified(ClassifiedError),
}

impl Classification {
    /// Returns the classified error, if any
    pub fn into_error(self) -> Option<ClassifiedError> {
        match self {
            Self::Unclassified => None,
            Self::Classified(error) => Some(error),
        }
    }

    /// Returns the kind, if classified
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Unclassified => None,
            Self::Classified(error) => Some(error.kind),
        }
    }
}

/// Look up a verbatim entry in the exact table
pub fn exact_match(value: &str) -> Option<ErrorKind> {
    EXACT_ERRORS
        .iter()
        .find(|(key, _)| *key == value)
        .map(|(_, kind)| *kind)
}

/// Look up the first broad entry contained in `value`
pub fn broad_match(value: &str) -> Option<ErrorKind> {
    BROAD_ERRORS
        .iter()
        .find(|(key, _)| value.contains(key))
        .map(|(_, kind)| *kind)
}

/// Classify a decoded error body
pub fn classify(payload: &Value) -> Classification {
    let code = field_as_string(payload, "errorCode");
    let code_name = field_as_string(payload, "errorCodeName");
    let message = field_as_string(payload, "message");

    if code.is_none() && code_name.is_none() && message.is_none() {
        return Classification::Unclassified;
    }

    let by_message = message
        .as_deref()
        .and_then(exact_match)
        .map(|kind| (kind, MatchStage::ExactMessage));

    let by_code = || {
        code.as_deref()
            .and_then(exact_match)
            .or_else(|| code_name.as_deref().and_then(exact_match))
            .map(|kind| (kind, MatchStage::ExactCode))
    };

    let by_broad = || {
        message
            .as_deref()
            .and_then(broad_match)
            .map(|kind| (kind, MatchStage::BroadMessage))
    };

    let (kind, stage) = by_message
        .or_else(by_code)
        .or_else(by_broad)
        .unwrap_or((ErrorKind::ExchangeError, MatchStage::Fallback));

    Classification::Classified(ClassifiedError {
        kind,
        venue_code: code.or(code_name),
        venue_message: message.unwrap_or_default(),
        stage,
        raw_payload: payload.clone(),
    })
}

/// Reads a string or numeric field; empty strings count as absent
fn field_as_string(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind_of(payload: Value) -> Option<ErrorKind> {
        classify(&payload).kind()
    }

    #[test]
    fn test_exact_code_wins_over_unmatched_message() {
        let result = classify(&json!({
            "errorCode": "UNKNOWN_ORDER",
            "message": "order could not be located"
        }));
        let error = result.into_error().unwrap();
        assert_eq!(error.kind, ErrorKind::OrderNotFound);
        assert_eq!(error.stage, MatchStage::ExactCode);
        assert_eq!(error.venue_code.as_deref(), Some("UNKNOWN_ORDER"));
    }

    #[test]
    fn test_exact_message_checked_first() {
        let error = classify(&json!({
            "errorCode": "UNKNOWN_ORDER",
            "message": "MARKET_NOT_SUPPORTED"
        }))
        .into_error()
        .unwrap();
        assert_eq!(error.kind, ErrorKind::BadSymbol);
        assert_eq!(error.stage, MatchStage::ExactMessage);
    }

    #[test]
    fn test_broad_message_without_code() {
        let error = classify(&json!({ "message": "MALFORMED_ORDER" }))
            .into_error()
            .unwrap();
        assert_eq!(error.kind, ErrorKind::BadRequest);
        assert_eq!(error.stage, MatchStage::BroadMessage);
        assert!(error.venue_code.is_none());
    }

    #[test]
    fn test_broad_does_not_shadow_exact() {
        // "UNKNOWN_ORDER" also contains the broad fragment "UNKNOWN"
        assert_eq!(
            kind_of(json!({ "message": "UNKNOWN_ORDER" })),
            Some(ErrorKind::OrderNotFound)
        );
        assert_eq!(
            kind_of(json!({ "message": "UNKNOWN failure in matching engine" })),
            Some(ErrorKind::ExchangeError)
        );
    }

    #[test]
    fn test_unmatched_falls_back_to_exchange_error() {
        let error = classify(&json!({
            "errorCode": "NOT_A_REAL_CODE",
            "message": "totally unexpected"
        }))
        .into_error()
        .unwrap();
        assert_eq!(error.kind, ErrorKind::ExchangeError);
        assert_eq!(error.stage, MatchStage::Fallback);
        assert_eq!(error.venue_message, "totally unexpected");
        assert_eq!(error.raw_payload["errorCode"], "NOT_A_REAL_CODE");
    }

    #[test]
    fn test_no_fields_is_unclassified() {
        assert_eq!(classify(&json!({})), Classification::Unclassified);
        assert_eq!(
            classify(&json!({ "message": "", "detail": "x" })),
            Classification::Unclassified
        );
        assert_eq!(classify(&json!([1, 2, 3])), Classification::Unclassified);
    }

    #[test]
    fn test_numeric_code_with_code_name() {
        let error = classify(&json!({
            "errorCode": 3001,
            "errorCodeName": "INSUFFICIENT_AVAILABLE_BALANCE",
            "message": "Insufficient balance"
        }))
        .into_error()
        .unwrap();
        assert_eq!(error.kind, ErrorKind::InsufficientFunds);
        assert_eq!(error.venue_code.as_deref(), Some("3001"));
    }

    #[test]
    fn test_recovery_strategies() {
        assert!(matches!(
            ErrorKind::AuthenticationError.recovery_strategy(),
            RecoveryStrategy::Reauthenticate
        ));
        assert!(ErrorKind::ExchangeNotAvailable.recovery_strategy().allows_retry());
        assert!(!ErrorKind::InsufficientFunds.recovery_strategy().allows_retry());
        assert_eq!(
            RecoveryStrategy::service_retry().initial_delay(),
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_error_categories() {
        assert!(ErrorKind::AuthenticationError.is_auth_error());
        assert!(ErrorKind::InsufficientFunds.is_trading_error());
        assert!(!ErrorKind::BadSymbol.is_trading_error());
    }
}
