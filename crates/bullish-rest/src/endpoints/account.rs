//! Private account endpoints
//!
//! These endpoints require authentication.

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::client::BullishRestClient;
use crate::descriptor::RequestDescriptor;
use crate::endpoint;
use crate::error::{RestError, RestResult};
use crate::pagination::{Page, PageRequest};
use crate::types::TradingAccount;

/// Private account endpoints
pub struct AccountEndpoints<'a> {
    client: &'a BullishRestClient,
}

impl<'a> AccountEndpoints<'a> {
    pub fn new(client: &'a BullishRestClient) -> Self {
        Self { client }
    }

    fn with_account(&self, desc: RequestDescriptor) -> RequestDescriptor {
        desc.param_opt("tradingAccountId", self.client.trading_account_id())
    }

    /// Get the trading accounts of the API key
    #[instrument(skip(self))]
    pub async fn fetch_trading_accounts(&self) -> RestResult<Vec<TradingAccount>> {
        debug!("Fetching trading accounts");
        self.client
            .execute_as(&RequestDescriptor::for_endpoint(endpoint::TRADING_ACCOUNTS))
            .await
    }

    /// Fetch the accounts and select the primary one (or the first)
    #[instrument(skip(self))]
    pub async fn select_default_account(&self) -> RestResult<TradingAccount> {
        let accounts = self.fetch_trading_accounts().await?;
        let account = accounts
            .iter()
            .find(|account| account.is_primary())
            .or_else(|| accounts.first())
            .cloned()
            .ok_or_else(|| RestError::Parse("no trading accounts returned".to_string()))?;

        self.client.select_trading_account(&account);
        info!(account = %account.trading_account_id, "Using trading account");
        Ok(account)
    }

    /// Get asset balances
    #[instrument(skip(self))]
    pub async fn fetch_balances(&self) -> RestResult<Vec<Value>> {
        let desc = self.with_account(RequestDescriptor::for_endpoint(endpoint::ACCOUNT_ASSETS));
        self.client.execute_as(&desc).await
    }

    /// Get own trades, one page at a time
    #[instrument(skip(self))]
    pub async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        page: &PageRequest,
    ) -> RestResult<Page<Value>> {
        let desc = self
            .with_account(RequestDescriptor::for_endpoint(endpoint::TRADES))
            .param_opt("symbol", symbol);
        self.client.execute_page(&page.apply(desc)).await
    }

    /// Get deposits and withdrawals, one page at a time
    #[instrument(skip(self))]
    pub async fn fetch_deposits_withdrawals(&self, page: &PageRequest) -> RestResult<Page<Value>> {
        let desc = RequestDescriptor::for_endpoint(endpoint::WALLET_TRANSACTIONS);
        self.client.execute_page(&page.apply(desc)).await
    }

    /// Get derivatives positions
    ///
    /// Only derivatives positions are reported by the venue.
    #[instrument(skip(self))]
    pub async fn fetch_positions(&self, symbol: Option<&str>) -> RestResult<Vec<Value>> {
        let desc = self
            .with_account(RequestDescriptor::for_endpoint(endpoint::DERIVATIVES_POSITIONS))
            .param_opt("symbol", symbol);
        self.client.execute_as(&desc).await
    }

    /// Get the derivatives position for one symbol, if any
    #[instrument(skip(self))]
    pub async fn fetch_position(&self, symbol: &str) -> RestResult<Option<Value>> {
        let positions = self.fetch_positions(Some(symbol)).await?;
        Ok(positions
            .into_iter()
            .find(|position| position["symbol"].as_str() == Some(symbol)))
    }

    /// Get AMM instructions
    #[instrument(skip(self))]
    pub async fn fetch_amm_instructions(&self, symbol: Option<&str>) -> RestResult<Vec<Value>> {
        let desc = self
            .with_account(RequestDescriptor::for_endpoint(endpoint::AMM_INSTRUCTIONS))
            .param_opt("symbol", symbol);
        self.client.execute_as(&desc).await
    }

    /// Get one AMM instruction
    #[instrument(skip(self))]
    pub async fn fetch_amm_instruction(&self, instruction_id: &str) -> RestResult<Value> {
        let desc = self
            .with_account(RequestDescriptor::for_endpoint(endpoint::AMM_INSTRUCTION_BY_ID))
            .path_param("instructionid", instruction_id);
        self.client.execute(&desc).await
    }
}
