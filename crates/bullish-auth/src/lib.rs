//! Authentication primitives for the Bullish REST API
//!
//! This crate holds everything the request pipeline needs to prove who it
//! is: API credentials, HMAC-SHA256 signing, the nonce source, and the
//! cached session token obtained through the HMAC login handshake.
//!
//! # Example
//!
//! ```no_run
//! use bullish_auth::{Clock, Credentials, SystemClock};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = Credentials::from_env()?;
//!     let clock = SystemClock::new();
//!
//!     let timestamp = clock.now_ms();
//!     let nonce = clock.next_nonce();
//!     let message = format!("{timestamp}{nonce}GET/trading-api/v1/users/hmac/login");
//!     println!("signature: {}", creds.sign(&message)?);
//!
//!     Ok(())
//! }
//! ```

mod clock;
mod credentials;
mod error;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::Credentials;
pub use error::{AuthError, AuthResult};
pub use session::{Authenticator, Session, SessionManager, SessionState};
