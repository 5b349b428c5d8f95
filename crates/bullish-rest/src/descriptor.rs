//! Logical request descriptors
//!
//! A [`RequestDescriptor`] is built per call and consumed once by the
//! signer. The variant carries the trust tier; private requests are a
//! separate [`PrivateRequest`] type that the signer only accepts together
//! with a [`Session`](bullish_auth::Session).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::endpoint::{Endpoint, TrustTier};

/// Query or body parameters, kept in lexical key order
pub type Params = BTreeMap<String, Value>;

/// Endpoint plus the caller's parameters
///
/// Path placeholders are filled from `params`; whatever is left becomes the
/// query string (GET) or the JSON body (POST).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub endpoint: Endpoint,
    pub params: Params,
}

impl RequestParts {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: Params::new(),
        }
    }
}

/// A request tagged with its trust tier
#[derive(Debug, Clone, PartialEq)]
pub enum RequestDescriptor {
    /// No credentials
    Public(RequestParts),
    /// Login handshake
    PublicSigned(RequestParts),
    /// Needs a live session to be signed
    Private(PrivateRequest),
}

/// The two session-bound tiers
#[derive(Debug, Clone, PartialEq)]
pub enum PrivateRequest {
    /// Bearer token, no body signature
    Get(RequestParts),
    /// Bearer token plus signed JSON body
    Post(RequestParts),
}

impl PrivateRequest {
    pub fn tier(&self) -> TrustTier {
        match self {
            Self::Get(_) => TrustTier::PrivateGet,
            Self::Post(_) => TrustTier::PrivatePost,
        }
    }

    pub fn parts(&self) -> &RequestParts {
        match self {
            Self::Get(parts) | Self::Post(parts) => parts,
        }
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        match self {
            Self::Get(parts) | Self::Post(parts) => parts,
        }
    }
}

impl RequestDescriptor {
    /// Start a descriptor; the variant follows the endpoint's tier
    pub fn for_endpoint(endpoint: Endpoint) -> Self {
        let parts = RequestParts::new(endpoint);
        match endpoint.tier {
            TrustTier::Public => Self::Public(parts),
            TrustTier::PublicSigned => Self::PublicSigned(parts),
            TrustTier::PrivateGet => Self::Private(PrivateRequest::Get(parts)),
            TrustTier::PrivatePost => Self::Private(PrivateRequest::Post(parts)),
        }
    }

    /// Fill a `{name}` placeholder of the path template
    pub fn path_param(self, name: &str, value: impl Into<String>) -> Self {
        self.param(name, Value::String(value.into()))
    }

    /// Add a query or body parameter
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parts_mut().params.insert(name.to_string(), value.into());
        self
    }

    /// Add a parameter only when `value` is present
    pub fn param_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Merge a whole parameter map; later keys win
    pub fn params(mut self, params: Params) -> Self {
        self.parts_mut().params.extend(params);
        self
    }

    pub fn tier(&self) -> TrustTier {
        match self {
            Self::Public(_) => TrustTier::Public,
            Self::PublicSigned(_) => TrustTier::PublicSigned,
            Self::Private(private) => private.tier(),
        }
    }

    pub fn parts(&self) -> &RequestParts {
        match self {
            Self::Public(parts) | Self::PublicSigned(parts) => parts,
            Self::Private(private) => private.parts(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.parts().endpoint
    }

    fn parts_mut(&mut self) -> &mut RequestParts {
        match self {
            Self::Public(parts) | Self::PublicSigned(parts) => parts,
            Self::Private(private) => private.parts_mut(),
        }
    }
}
