//! Types for Bullish REST API requests and responses
//!
//! Only the records the pipeline itself needs are typed. Everything else is
//! returned as `serde_json::Value`.

use bullish_types::{OrderType, Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::Params;
use crate::error::{RestError, RestResult};

// ============================================================================
// Server Types
// ============================================================================

/// Nonce window accepted by the venue, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerNonce {
    pub lower_bound: u64,
    pub upper_bound: u64,
}

impl ServerNonce {
    /// Whether `nonce` falls inside the window
    pub fn accepts(&self, nonce: u64) -> bool {
        (self.lower_bound..=self.upper_bound).contains(&nonce)
    }
}

/// Server time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTime {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// ISO 8601 rendering of `timestamp`
    pub datetime: String,
}

// ============================================================================
// Account Types
// ============================================================================

/// A trading account available to the API key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingAccount {
    pub trading_account_id: String,
    #[serde(default)]
    pub trading_account_name: Option<String>,
    /// Sent as `BX-RATELIMIT-TOKEN` on order entry
    #[serde(default)]
    pub rate_limit_token: Option<String>,
    /// Reported as `"true"`/`"false"` strings by the venue
    #[serde(default)]
    pub is_primary_account: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TradingAccount {
    pub fn is_primary(&self) -> bool {
        match &self.is_primary_account {
            Some(Value::Bool(primary)) => *primary,
            Some(Value::String(primary)) => primary.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

// ============================================================================
// Trading Types
// ============================================================================

/// Order entry request
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for limit and stop-limit orders
    pub price: Option<Decimal>,
    pub time_in_force: TimeInForce,
    /// Generated from the nonce source when absent
    pub client_order_id: Option<String>,
    /// Extra venue fields merged into the body
    pub extra: Params,
}

impl CreateOrderRequest {
    /// Create a market order
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            time_in_force: TimeInForce::default(),
            client_order_id: None,
            extra: Params::new(),
        }
    }

    /// Create a limit order
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            order_type: OrderType::Limit,
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Add an extra body field
    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(name.to_string(), value.into());
        self
    }

    /// Reject requests the venue would refuse
    pub fn validate(&self) -> RestResult<()> {
        if self.symbol.is_empty() {
            return Err(RestError::InvalidParameter("symbol is empty".to_string()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(RestError::InvalidParameter(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.order_type.requires_price() && self.price.is_none() {
            return Err(RestError::InvalidParameter(format!(
                "{} orders require a price",
                self.order_type.as_str()
            )));
        }
        Ok(())
    }

    /// Body parameters for `V3CreateOrder`
    ///
    /// Decimals are sent as strings. `client_order_id` is used when the
    /// request does not carry its own.
    pub fn to_params(
        &self,
        client_order_id: &str,
        trading_account_id: Option<&str>,
    ) -> RestResult<Params> {
        self.validate()?;

        let mut params = Params::new();
        params.insert("symbol".into(), self.symbol.clone().into());
        params.insert("commandType".into(), "V3CreateOrder".into());
        params.insert("side".into(), self.side.as_str().into());
        params.insert("type".into(), self.order_type.as_str().into());
        params.insert("timeInForce".into(), self.time_in_force.as_str().into());
        params.insert("quantity".into(), self.quantity.to_string().into());
        params.insert(
            "clientOrderId".into(),
            self.client_order_id
                .as_deref()
                .unwrap_or(client_order_id)
                .into(),
        );
        if let Some(account) = trading_account_id {
            params.insert("tradingAccountId".into(), account.into());
        }
        if let Some(price) = self.price {
            params.insert("price".into(), price.to_string().into());
        }
        params.extend(self.extra.clone());
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_limit_order_params() {
        let order = CreateOrderRequest::limit("BTCUSDC", Side::Buy, dec!(0.5), dec!(42000.10))
            .with_time_in_force(TimeInForce::Ioc);
        let params = order.to_params("1700000000000123", Some("111000000000001")).unwrap();

        assert_eq!(params["commandType"], json!("V3CreateOrder"));
        assert_eq!(params["side"], json!("BUY"));
        assert_eq!(params["type"], json!("LIMIT"));
        assert_eq!(params["timeInForce"], json!("IOC"));
        assert_eq!(params["quantity"], json!("0.5"));
        assert_eq!(params["price"], json!("42000.10"));
        assert_eq!(params["clientOrderId"], json!("1700000000000123"));
        assert_eq!(params["tradingAccountId"], json!("111000000000001"));
    }

    #[test]
    fn test_market_order_has_no_price() {
        let order = CreateOrderRequest::market("ETHUSDC", Side::Sell, dec!(2))
            .with_client_order_id("my-id");
        let params = order.to_params("ignored", None).unwrap();

        assert!(!params.contains_key("price"));
        assert!(!params.contains_key("tradingAccountId"));
        assert_eq!(params["timeInForce"], json!("GTC"));
        assert_eq!(params["clientOrderId"], json!("my-id"));
    }

    #[test]
    fn test_order_validation() {
        let mut order = CreateOrderRequest::market("BTCUSDC", Side::Buy, dec!(1));
        order.order_type = OrderType::Limit;
        assert!(matches!(order.validate(), Err(RestError::InvalidParameter(_))));

        let zero = CreateOrderRequest::market("BTCUSDC", Side::Buy, Decimal::ZERO);
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_trading_account_parsing() {
        let account: TradingAccount = serde_json::from_value(json!({
            "tradingAccountId": "111000000000001",
            "tradingAccountName": "main",
            "rateLimitToken": "rl-abc",
            "isPrimaryAccount": "true",
            "isBorrowing": "false"
        }))
        .unwrap();

        assert!(account.is_primary());
        assert_eq!(account.rate_limit_token.as_deref(), Some("rl-abc"));
        assert_eq!(account.other["isBorrowing"], json!("false"));
    }

    #[test]
    fn test_server_nonce_window() {
        let nonce: ServerNonce = serde_json::from_value(json!({
            "lowerBound": 1_700_000_000_000_000u64,
            "upperBound": 1_700_086_400_000_000u64
        }))
        .unwrap();
        assert!(nonce.accepts(1_700_000_000_000_123));
        assert!(!nonce.accepts(1_600_000_000_000_000));
    }
}
