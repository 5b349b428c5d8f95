//! Shared types for the Bullish REST API
//!
//! This crate provides the error taxonomy and the small enums used across
//! the workspace. It has minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`ErrorKind`] - Canonical error kinds surfaced to callers
//! - [`classify`], [`Classification`], [`ClassifiedError`] - Error body classifier
//! - [`RecoveryStrategy`] - Suggested handling per error kind
//! - [`Side`], [`OrderType`], [`TimeInForce`], [`Timeframe`] - Order and candle enums

pub mod enums;
pub mod error;
pub mod error_codes;

pub use enums::*;
pub use error::*;
pub use error_codes::*;
