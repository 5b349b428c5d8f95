//! Tier-aware request signing
//!
//! [`RequestSigner`] turns a request descriptor into a [`SignedRequest`]:
//! a method, URL, header list and optional body that any transport can
//! send. Signing is a pure function of the descriptor, the session, the
//! credentials and the clock; nothing here touches the network.
//!
//! # Signing material
//!
//! | Tier | Material | Signature |
//! |------|----------|-----------|
//! | login | `ts + nonce + "GET" + path` | `HMAC(secret, material)` |
//! | private POST | `ts + nonce + "POST" + path + body` | `HMAC(secret, hex(SHA256(material)))` |
//!
//! `path` is the URL path only (e.g. `/trading-api/v2/orders`), with no
//! host and no query string.

use std::fmt;
use std::sync::Arc;

use bullish_auth::{Clock, Credentials, Session};
use parking_lot::RwLock;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::descriptor::{Params, PrivateRequest, RequestParts};
use crate::endpoint::HttpMethod;
use crate::environment::Environment;
use crate::error::{RestError, RestResult};

pub const HEADER_PUBLIC_KEY: &str = "BX-PUBLIC-KEY";
pub const HEADER_NONCE: &str = "BX-NONCE";
pub const HEADER_SIGNATURE: &str = "BX-SIGNATURE";
pub const HEADER_TIMESTAMP: &str = "BX-TIMESTAMP";
pub const HEADER_API_KEY: &str = "BM-AUTH-APIKEY";
pub const HEADER_RATE_LIMIT_TOKEN: &str = "BX-RATELIMIT-TOKEN";
pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// A request ready for the transport
///
/// Never contains the secret; only derived signatures and the session
/// token.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl SignedRequest {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case(HEADER_AUTHORIZATION)
                    || name.eq_ignore_ascii_case(HEADER_SIGNATURE)
                {
                    (*name, "[REDACTED]")
                } else {
                    (*name, value.as_str())
                }
            })
            .collect();

        f.debug_struct("SignedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Builds signed requests for one client
#[derive(Debug)]
pub struct RequestSigner {
    environment: Environment,
    clock: Arc<dyn Clock>,
    rate_limit_token: RwLock<Option<String>>,
}

impl RequestSigner {
    pub fn new(environment: Environment, clock: Arc<dyn Clock>) -> Self {
        Self {
            environment,
            clock,
            rate_limit_token: RwLock::new(None),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Token sent as `BX-RATELIMIT-TOKEN` on order entry
    pub fn set_rate_limit_token(&self, token: Option<String>) {
        *self.rate_limit_token.write() = token;
    }

    pub fn rate_limit_token(&self) -> Option<String> {
        self.rate_limit_token.read().clone()
    }

    /// Sign a session-bound request
    ///
    /// Public and login requests go through [`sign_public`](Self::sign_public)
    /// and [`sign_login`](Self::sign_login); nothing private can be signed
    /// without a session.
    pub fn sign_private(
        &self,
        request: &PrivateRequest,
        credentials: &Credentials,
        session: &Session,
    ) -> RestResult<SignedRequest> {
        match request {
            PrivateRequest::Get(parts) => self.sign_bearer_get(credentials, session, parts),
            PrivateRequest::Post(parts) => self.sign_body_post(credentials, session, parts),
        }
    }

    /// No signature; canonical query string
    pub fn sign_public(&self, parts: &RequestParts) -> RestResult<SignedRequest> {
        let (url, rest) = self.resolve(parts)?;
        Ok(SignedRequest {
            method: HttpMethod::Get,
            url: with_query(url, &canonical_query(&rest)?),
            headers: Vec::new(),
            body: None,
        })
    }

    /// Login handshake headers, signed over the URL path
    #[instrument(skip_all, fields(path = parts.endpoint.path))]
    pub fn sign_login(
        &self,
        credentials: &Credentials,
        parts: &RequestParts,
    ) -> RestResult<SignedRequest> {
        let (url, rest) = self.resolve(parts)?;
        let path = signing_path(&url)?;

        let timestamp = self.clock.now_ms().to_string();
        let nonce = self.clock.next_nonce().to_string();
        let material = format!("{timestamp}{nonce}{}{path}", HttpMethod::Get);
        let signature = credentials.sign(&material)?;
        debug!(nonce = %nonce, "Signed login request");

        Ok(SignedRequest {
            method: HttpMethod::Get,
            url: with_query(url, &canonical_query(&rest)?),
            headers: vec![
                (HEADER_PUBLIC_KEY, credentials.public_key().to_string()),
                (HEADER_NONCE, nonce),
                (HEADER_SIGNATURE, signature),
                (HEADER_TIMESTAMP, timestamp),
            ],
            body: None,
        })
    }

    /// Bearer token headers; no signature
    fn sign_bearer_get(
        &self,
        credentials: &Credentials,
        session: &Session,
        parts: &RequestParts,
    ) -> RestResult<SignedRequest> {
        let (url, rest) = self.resolve(parts)?;
        Ok(SignedRequest {
            method: HttpMethod::Get,
            url: with_query(url, &canonical_query(&rest)?),
            headers: vec![
                ("Accept", "application/json".to_string()),
                ("Accept-Charset", "UTF-8".to_string()),
                ("Content-Type", "application/json".to_string()),
                (HEADER_AUTHORIZATION, session.bearer()),
                (HEADER_API_KEY, credentials.api_key().to_string()),
            ],
            body: None,
        })
    }

    /// Canonical JSON body with a double-hashed signature
    #[instrument(skip_all, fields(path = parts.endpoint.path))]
    fn sign_body_post(
        &self,
        credentials: &Credentials,
        session: &Session,
        parts: &RequestParts,
    ) -> RestResult<SignedRequest> {
        let (url, rest) = self.resolve(parts)?;
        let path = signing_path(&url)?;
        let body = canonical_body(&rest)?;

        let timestamp = self.clock.now_ms().to_string();
        let nonce = self.clock.next_nonce().to_string();
        let material = format!("{timestamp}{nonce}{}{path}{body}", HttpMethod::Post);
        let signature = credentials.sign_digest(&material)?;
        debug!(nonce = %nonce, "Signed POST request");

        let mut headers = vec![
            ("Accept", "application/json".to_string()),
            ("Accept-Charset", "UTF-8".to_string()),
            ("Content-Type", "application/json".to_string()),
            (HEADER_AUTHORIZATION, session.bearer()),
            (HEADER_API_KEY, credentials.api_key().to_string()),
            (HEADER_SIGNATURE, signature),
            (HEADER_TIMESTAMP, timestamp),
            (HEADER_NONCE, nonce),
        ];
        if let Some(token) = self.rate_limit_token() {
            headers.push((HEADER_RATE_LIMIT_TOKEN, token));
        }

        Ok(SignedRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: Some(body),
        })
    }

    /// Substitute path placeholders and return the URL without query,
    /// plus the parameters that were not consumed by the path
    fn resolve(&self, parts: &RequestParts) -> RestResult<(String, Params)> {
        let endpoint = parts.endpoint;
        let mut rest = parts.params.clone();
        let mut path = endpoint.path.to_string();

        for name in endpoint.placeholders() {
            let value = rest
                .remove(name)
                .and_then(|value| render_value(&value))
                .ok_or_else(|| {
                    RestError::InvalidParameter(format!(
                        "missing path parameter '{name}' for {}",
                        endpoint.path
                    ))
                })?;
            path = path.replace(&format!("{{{name}}}"), &value);
        }

        let base = self.environment.base_url(endpoint.section);
        Ok((format!("{base}/{path}"), rest))
    }
}

/// Render a parameter the way it appears in a query string
///
/// Strings are emitted raw, `null` is dropped, anything else uses its JSON
/// text.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// URL-encoded query in lexical key order
pub fn canonical_query(params: &Params) -> RestResult<String> {
    let pairs: Vec<(&str, String)> = params
        .iter()
        .filter_map(|(key, value)| render_value(value).map(|v| (key.as_str(), v)))
        .collect();
    serde_urlencoded::to_string(pairs).map_err(|e| RestError::InvalidParameter(e.to_string()))
}

/// Compact JSON with sorted keys
pub fn canonical_body(params: &Params) -> RestResult<String> {
    Ok(serde_json::to_string(params)?)
}

fn signing_path(url: &str) -> RestResult<String> {
    let parsed = Url::parse(url)
        .map_err(|e| RestError::InvalidParameter(format!("invalid URL {url}: {e}")))?;
    Ok(parsed.path().to_string())
}

fn with_query(url: String, query: &str) -> String {
    if query.is_empty() {
        url
    } else {
        format!("{url}?{query}")
    }
}
