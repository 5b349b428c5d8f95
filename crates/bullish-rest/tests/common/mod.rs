//! Common test utilities and fixtures for integration tests
//!
//! Response bodies mirror what the venue returns for each endpoint.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bullish_rest::{
    BullishRestClient, ClientConfig, Credentials, HttpResponse, HttpTransport, ManualClock,
    SignedRequest, TransportError,
};
use parking_lot::Mutex;
use reqwest::Url;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-secret-key";
pub const FIXED_TS: u64 = 1_700_000_000_000;
pub const FIXED_NONCE: u64 = 1_700_000_000_000_123;
pub const ACCOUNT_ID: &str = "111000000000001";

pub const LOGIN_PATH: &str = "/trading-api/v1/users/hmac/login";
pub const ORDERS_PATH: &str = "/trading-api/v2/orders";

/// Successful HMAC login
pub const LOGIN_RESPONSE: &str = r#"{
    "authorizer": "03E02367E8C900000500000000000000",
    "ownerAuthorizer": "03E02367E8C900000500000000000000",
    "token": "eyJhbGciOiJIUzI1NiJ9.test-session"
}"#;

/// Login rejected by the venue
pub const LOGIN_REJECTED: &str = r#"{
    "errorCode": "EosUserNotExistsException",
    "errorCodeName": "EOS_USER_NOT_EXISTS",
    "message": "EosUserNotExistsException"
}"#;

pub const TRADING_ACCOUNTS_RESPONSE: &str = r#"[
    {
        "tradingAccountId": "111000000000002",
        "tradingAccountName": "secondary",
        "isPrimaryAccount": "false",
        "rateLimitToken": "rl-secondary"
    },
    {
        "tradingAccountId": "111000000000001",
        "tradingAccountName": "main",
        "isPrimaryAccount": "true",
        "rateLimitToken": "rl-main",
        "isBorrowing": "false"
    }
]"#;

/// First page of a `_metaData=true` order listing
pub const ORDERS_PAGE_1: &str = r#"{
    "data": [
        { "orderId": "390755200067862528", "symbol": "BTCUSDC", "status": "OPEN" },
        { "orderId": "390755200067862529", "symbol": "BTCUSDC", "status": "CLOSED" }
    ],
    "links": {
        "next": "/trading-api/v2/orders?_pageSize=25&_nextPage=cursor-page-2",
        "previous": null
    }
}"#;

/// Last page of the same listing
pub const ORDERS_PAGE_2: &str = r#"{
    "data": [
        { "orderId": "390755200067862530", "symbol": "BTCUSDC", "status": "CANCELLED" }
    ],
    "links": {
        "next": null,
        "previous": "/trading-api/v2/orders?_pageSize=25&_previousPage=cursor-page-1"
    }
}"#;

pub const UNKNOWN_ORDER: &str = r#"{
    "errorCode": "UNKNOWN_ORDER",
    "errorCodeName": "UNKNOWN_ORDER",
    "message": "Order not found for the given id"
}"#;

pub const NOT_LOGGED_IN: &str = r#"{
    "errorCode": "CLIENT_NOT_LOGGED_IN",
    "message": "CLIENT_NOT_LOGGED_IN"
}"#;

pub const ORDER_ACCEPTED: &str = r#"{
    "message": "Command acknowledged - CreateOrder",
    "requestId": "633910976353665024",
    "orderId": "633910976353665024",
    "clientOrderId": "1700000000000123"
}"#;

pub const SERVER_TIME: &str = r#"{ "timestamp": 1700000000000, "datetime": "2023-11-14T22:13:20.000Z" }"#;

pub const MARKETS_RESPONSE: &str = r#"[
    { "symbol": "BTCUSDC", "baseSymbol": "BTC", "quoteSymbol": "USDC", "marketType": "SPOT" },
    { "symbol": "ETHUSDC", "baseSymbol": "ETH", "quoteSymbol": "USDC", "marketType": "SPOT" }
]"#;

pub const BTC_TICK: &str = r#"{ "symbol": "BTCUSDC", "last": "37000.5", "bestBid": "37000.1", "bestAsk": "37001.0" }"#;

pub const ETH_TICK: &str = r#"{ "symbol": "ETHUSDC", "last": "2050.25", "bestBid": "2050.00", "bestAsk": "2050.50" }"#;

pub const POSITIONS_RESPONSE: &str = r#"[
    {
        "tradingAccountId": "111000000000001",
        "symbol": "BTC-USDC-PERP",
        "side": "BUY",
        "quantity": "1.5",
        "notional": "55500.75"
    },
    {
        "tradingAccountId": "111000000000001",
        "symbol": "ETH-USDC-PERP",
        "side": "SELL",
        "quantity": "10",
        "notional": "20502.5"
    }
]"#;

pub const SERVER_NONCE: &str = r#"{ "lowerBound": 1699920000000000, "upperBound": 1700006400000000 }"#;

/// Transport that answers from canned routes and records every request
///
/// Routes are keyed by URL path (no query). A route with several queued
/// responses hands them out in order and then repeats the last one. A
/// delayed path picks its response on arrival and answers after the delay.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    requests: Mutex<Vec<SignedRequest>>,
    delays: HashMap<String, Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every login response, to widen the window for racing callers
    pub fn with_login_delay(self, delay: Duration) -> Self {
        self.with_delay(LOGIN_PATH, delay)
    }

    /// Delay every response on `path`
    pub fn with_delay(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn route(self, path: &str, status: u16, body: &str) -> Self {
        self.push(path, status, body);
        self
    }

    pub fn push(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(HttpResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<SignedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| path_of(&request.url) == path)
            .collect()
    }

    pub fn login_calls(&self) -> usize {
        self.requests_to(LOGIN_PATH).len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: &SignedRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let path = path_of(&request.url);
        let response = {
            let mut routes = self.routes.lock();
            match routes.get_mut(&path) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        if let Some(delay) = self.delays.get(&path) {
            tokio::time::sleep(*delay).await;
        }
        Ok(response.unwrap_or_else(|| HttpResponse::new(404, "no route")))
    }
}

pub fn path_of(url: &str) -> String {
    Url::parse(url)
        .map(|url| url.path().to_string())
        .unwrap_or_default()
}

pub fn query_of(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

pub fn credentials() -> Credentials {
    Credentials::new(API_KEY, API_SECRET).unwrap()
}

/// Authenticated client on a fixed clock
pub fn fixed_client(transport: Arc<MockTransport>) -> BullishRestClient {
    let config = ClientConfig::new()
        .with_credentials(credentials())
        .with_clock(Arc::new(ManualClock::new(FIXED_TS, FIXED_NONCE)));
    BullishRestClient::with_transport(config, transport)
}

/// Authenticated client on the system clock
pub fn live_client(transport: Arc<MockTransport>) -> BullishRestClient {
    let config = ClientConfig::new().with_credentials(credentials());
    BullishRestClient::with_transport(config, transport)
}

/// Public-only client
pub fn public_client(transport: Arc<MockTransport>) -> BullishRestClient {
    BullishRestClient::with_transport(ClientConfig::new(), transport)
}
