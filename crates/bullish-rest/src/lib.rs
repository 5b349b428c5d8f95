//! REST API client for the Bullish exchange
//!
//! This crate implements the authenticated request pipeline: per-tier
//! request signing, the cached login session, cursor pagination and the
//! mapping of venue error bodies onto a stable error taxonomy.
//!
//! # Trust tiers
//!
//! - **Public**: no credentials
//! - **Public signed**: the HMAC login handshake
//! - **Private GET**: bearer token from the login session
//! - **Private POST**: bearer token plus an HMAC-SHA256 signature over a
//!   canonical JSON body
//!
//! The session is obtained lazily on the first private call and shared by
//! every clone of the client. Concurrent first calls trigger one login.
//!
//! # Example
//!
//! ```no_run
//! use bullish_rest::{BullishRestClient, ClientConfig, Credentials, Environment};
//! use bullish_rest::types::CreateOrderRequest;
//! use bullish_types::Side;
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new()
//!         .with_environment(Environment::Test)
//!         .with_credentials(Credentials::from_env()?);
//!     let client = BullishRestClient::with_config(config)?;
//!
//!     client.account()?.select_default_account().await?;
//!
//!     let order = CreateOrderRequest::limit("BTCUSDC", Side::Buy, Decimal::ONE, Decimal::from(30_000));
//!     let ack = client.trading()?.create_order(&order).await?;
//!     println!("{ack}");
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod descriptor;
pub mod endpoint;
pub mod endpoints;
pub mod environment;
pub mod error;
pub mod pagination;
pub mod signer;
pub mod transport;
pub mod types;

// Re-export main types
pub use bullish_auth::{Clock, Credentials, ManualClock, Session, SessionState, SystemClock};
pub use client::{interpret_response, BullishRestClient, ClientConfig};
pub use descriptor::{Params, PrivateRequest, RequestDescriptor, RequestParts};
pub use endpoint::{Endpoint, HttpMethod, TrustTier};
pub use environment::{ApiSection, Environment};
pub use error::{RestError, RestResult};
pub use pagination::{
    build_cursor, page_size_for, CursorDirection, Page, PageCursor, PageLinks, PageRequest,
};
pub use signer::{RequestSigner, SignedRequest};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
