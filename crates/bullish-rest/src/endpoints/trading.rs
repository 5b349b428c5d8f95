//! Private trading endpoints
//!
//! These endpoints require authentication.

use serde_json::Value;
use tracing::{info, instrument};

use crate::client::BullishRestClient;
use crate::descriptor::RequestDescriptor;
use crate::endpoint;
use crate::error::RestResult;
use crate::pagination::{Page, PageRequest};
use crate::types::CreateOrderRequest;

/// Private trading endpoints
pub struct TradingEndpoints<'a> {
    client: &'a BullishRestClient,
}

impl<'a> TradingEndpoints<'a> {
    pub fn new(client: &'a BullishRestClient) -> Self {
        Self { client }
    }

    /// Place an order
    ///
    /// `clientOrderId` defaults to a fresh nonce.
    #[instrument(skip(self, order), fields(symbol = %order.symbol, side = order.side.as_str()))]
    pub async fn create_order(&self, order: &CreateOrderRequest) -> RestResult<Value> {
        let client_order_id = self.client.clock().next_nonce().to_string();
        let account = self.client.trading_account_id();
        let params = order.to_params(&client_order_id, account.as_deref())?;

        let response = self
            .client
            .execute(&RequestDescriptor::for_endpoint(endpoint::CREATE_ORDER).params(params))
            .await?;
        info!("Order accepted");
        Ok(response)
    }

    /// Get orders, one page at a time
    #[instrument(skip(self))]
    pub async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        page: &PageRequest,
    ) -> RestResult<Page<Value>> {
        let desc = RequestDescriptor::for_endpoint(endpoint::ORDERS)
            .param_opt("tradingAccountId", self.client.trading_account_id())
            .param_opt("symbol", symbol);
        self.client.execute_page(&page.apply(desc)).await
    }

    /// Get one order by venue id
    #[instrument(skip(self))]
    pub async fn fetch_order(&self, order_id: &str) -> RestResult<Value> {
        let desc = RequestDescriptor::for_endpoint(endpoint::ORDER_BY_ID)
            .path_param("id", order_id)
            .param_opt("tradingAccountId", self.client.trading_account_id());
        self.client.execute(&desc).await
    }
}
