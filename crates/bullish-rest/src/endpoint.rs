//! Endpoint catalogue
//!
//! Every call the client makes is one of these constants. The trust tier
//! decides how the request is signed; the section picks the URL prefix.

use std::fmt;

use crate::environment::ApiSection;

/// Authentication class of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustTier {
    /// No credentials
    Public,
    /// Credential-derived signature, no session (login only)
    PublicSigned,
    /// Session token, no body signature
    PrivateGet,
    /// Session token plus a signature over the JSON body
    PrivatePost,
}

impl TrustTier {
    /// HTTP method implied by the tier
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::PrivatePost => HttpMethod::Post,
            Self::Public | Self::PublicSigned | Self::PrivateGet => HttpMethod::Get,
        }
    }

    /// Returns true if the tier needs a session
    pub const fn is_private(&self) -> bool {
        matches!(self, Self::PrivateGet | Self::PrivatePost)
    }
}

/// HTTP methods used by the venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical endpoint: path template, tier and URL section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Path relative to the section base, with `{name}` placeholders
    pub path: &'static str,
    /// How requests to this endpoint are signed
    pub tier: TrustTier,
    /// Base URL section
    pub section: ApiSection,
}

impl Endpoint {
    /// Session-bound tiers must live under a private section; checked when
    /// the constants are evaluated
    const fn new(path: &'static str, tier: TrustTier, section: ApiSection) -> Self {
        assert!(
            tier.is_private() == section.is_private(),
            "trust tier does not match API section"
        );
        Self {
            path,
            tier,
            section,
        }
    }

    /// HTTP method for this endpoint
    pub fn method(&self) -> HttpMethod {
        self.tier.method()
    }

    /// Placeholder names in the path template, in order
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    names.push(&after[..close]);
                    rest = &after[close + 1..];
                }
                None => break,
            }
        }
        names
    }
}

// Public market data
pub const MARKETS: Endpoint = Endpoint::new("markets", TrustTier::Public, ApiSection::PublicV1);
pub const MARKET_TRADES: Endpoint =
    Endpoint::new("markets/{symbol}/trades", TrustTier::Public, ApiSection::PublicV1);
pub const MARKET_CANDLE: Endpoint =
    Endpoint::new("markets/{symbol}/candle", TrustTier::Public, ApiSection::PublicV1);
pub const MARKET_TICK: Endpoint =
    Endpoint::new("markets/{symbol}/tick", TrustTier::Public, ApiSection::PublicV1);
pub const ASSETS: Endpoint = Endpoint::new("assets", TrustTier::Public, ApiSection::PublicV1);
pub const ORDER_BOOK: Endpoint = Endpoint::new(
    "markets/{symbol}/orderbook/hybrid",
    TrustTier::Public,
    ApiSection::PublicV1,
);
pub const NONCE: Endpoint = Endpoint::new("nonce", TrustTier::Public, ApiSection::PublicV1);
pub const TIME: Endpoint = Endpoint::new("time", TrustTier::Public, ApiSection::PublicV1);

// Login
pub const HMAC_LOGIN: Endpoint =
    Endpoint::new("users/hmac/login", TrustTier::PublicSigned, ApiSection::PublicV1);

// Private
pub const TRADING_ACCOUNTS: Endpoint = Endpoint::new(
    "accounts/trading-accounts",
    TrustTier::PrivateGet,
    ApiSection::PrivateV1,
);
pub const ORDERS: Endpoint = Endpoint::new("orders", TrustTier::PrivateGet, ApiSection::PrivateV2);
pub const CREATE_ORDER: Endpoint =
    Endpoint::new("orders", TrustTier::PrivatePost, ApiSection::PrivateV2);
pub const ORDER_BY_ID: Endpoint =
    Endpoint::new("orders/{id}", TrustTier::PrivateGet, ApiSection::PrivateV2);
pub const TRADES: Endpoint = Endpoint::new("trades", TrustTier::PrivateGet, ApiSection::PrivateV1);
pub const ACCOUNT_ASSETS: Endpoint =
    Endpoint::new("accounts/asset", TrustTier::PrivateGet, ApiSection::PrivateV2);
pub const WALLET_TRANSACTIONS: Endpoint = Endpoint::new(
    "wallets/transactions",
    TrustTier::PrivateGet,
    ApiSection::PrivateV1,
);
pub const AMM_INSTRUCTIONS: Endpoint =
    Endpoint::new("amm-instructions", TrustTier::PrivateGet, ApiSection::PrivateV2);
pub const AMM_INSTRUCTION_BY_ID: Endpoint = Endpoint::new(
    "amm-instructions/{instructionid}",
    TrustTier::PrivateGet,
    ApiSection::PrivateV2,
);
pub const DERIVATIVES_POSITIONS: Endpoint = Endpoint::new(
    "derivatives-positions",
    TrustTier::PrivateGet,
    ApiSection::PrivateV1,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_methods() {
        assert_eq!(CREATE_ORDER.method(), HttpMethod::Post);
        assert_eq!(ORDERS.method(), HttpMethod::Get);
        assert_eq!(HMAC_LOGIN.method(), HttpMethod::Get);
        assert!(!HMAC_LOGIN.tier.is_private());
        assert!(ORDER_BY_ID.tier.is_private());
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(ORDER_BOOK.placeholders(), vec!["symbol"]);
        assert_eq!(AMM_INSTRUCTION_BY_ID.placeholders(), vec!["instructionid"]);
        assert!(MARKETS.placeholders().is_empty());
    }

    #[test]
    fn test_private_endpoints_use_private_sections() {
        for endpoint in [
            TRADING_ACCOUNTS,
            ORDERS,
            CREATE_ORDER,
            ORDER_BY_ID,
            TRADES,
            ACCOUNT_ASSETS,
            WALLET_TRANSACTIONS,
            AMM_INSTRUCTIONS,
            AMM_INSTRUCTION_BY_ID,
            DERIVATIVES_POSITIONS,
        ] {
            assert!(endpoint.tier.is_private(), "{}", endpoint.path);
            assert!(endpoint.section.is_private(), "{}", endpoint.path);
        }
    }
}
