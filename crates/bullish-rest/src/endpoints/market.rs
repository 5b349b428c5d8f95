//! Public market data endpoints
//!
//! These endpoints don't require authentication.

use std::collections::BTreeMap;

use bullish_types::Timeframe;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::BullishRestClient;
use crate::descriptor::RequestDescriptor;
use crate::endpoint;
use crate::error::{RestError, RestResult};
use crate::types::{ServerNonce, ServerTime};

/// Candles requested when the caller gives no limit
pub const DEFAULT_CANDLE_LIMIT: u64 = 500;
/// Default `depth` of the hybrid order book
pub const DEFAULT_BOOK_DEPTH: u32 = 100;
/// Default `aggregationFactor` of the hybrid order book
pub const DEFAULT_AGGREGATION: u32 = 10;

/// Public market data endpoints
pub struct MarketEndpoints<'a> {
    client: &'a BullishRestClient,
}

impl<'a> MarketEndpoints<'a> {
    pub fn new(client: &'a BullishRestClient) -> Self {
        Self { client }
    }

    /// Get all markets
    #[instrument(skip(self))]
    pub async fn fetch_markets(&self) -> RestResult<Vec<Value>> {
        debug!("Fetching markets");
        self.client
            .execute_as(&RequestDescriptor::for_endpoint(endpoint::MARKETS))
            .await
    }

    /// Get all assets
    #[instrument(skip(self))]
    pub async fn fetch_assets(&self) -> RestResult<Vec<Value>> {
        self.client
            .execute_as(&RequestDescriptor::for_endpoint(endpoint::ASSETS))
            .await
    }

    /// Get the 24h ticker for one market
    #[instrument(skip(self))]
    pub async fn fetch_ticker(&self, symbol: &str) -> RestResult<Value> {
        let desc =
            RequestDescriptor::for_endpoint(endpoint::MARKET_TICK).path_param("symbol", symbol);
        self.client.execute(&desc).await
    }

    /// Get tickers keyed by symbol
    ///
    /// Without `symbols`, every listed market is fetched. The venue has no
    /// batch ticker route, so this issues one request per symbol.
    #[instrument(skip(self))]
    pub async fn fetch_tickers(
        &self,
        symbols: Option<&[&str]>,
    ) -> RestResult<BTreeMap<String, Value>> {
        let symbols: Vec<String> = match symbols {
            Some(symbols) => symbols.iter().map(|s| s.to_string()).collect(),
            None => self
                .fetch_markets()
                .await?
                .iter()
                .filter_map(|market| market["symbol"].as_str().map(str::to_string))
                .collect(),
        };
        debug!(count = symbols.len(), "Fetching tickers");

        let mut tickers = BTreeMap::new();
        for symbol in symbols {
            let ticker = self.fetch_ticker(&symbol).await?;
            tickers.insert(symbol, ticker);
        }
        Ok(tickers)
    }

    /// Get recent public trades
    #[instrument(skip(self))]
    pub async fn fetch_trades(&self, symbol: &str) -> RestResult<Vec<Value>> {
        let desc =
            RequestDescriptor::for_endpoint(endpoint::MARKET_TRADES).path_param("symbol", symbol);
        self.client.execute_as(&desc).await
    }

    /// Get candles
    ///
    /// Without `since`, the window ends now and spans `limit` candles
    /// (500 by default).
    #[instrument(skip(self))]
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<u64>,
        limit: Option<u64>,
    ) -> RestResult<Vec<Value>> {
        let (start, end) = candle_window(self.client.clock().now_ms(), timeframe, since, limit);
        debug!(start, end, "Fetching candles");

        let desc = RequestDescriptor::for_endpoint(endpoint::MARKET_CANDLE)
            .path_param("symbol", symbol)
            .param("timeBucket", timeframe.as_str())
            .param("createdAtDatetime[gte]", iso8601(start)?)
            .param("createdAtDatetime[lte]", iso8601(end)?);
        self.client.execute_as(&desc).await
    }

    /// Get the hybrid order book
    ///
    /// Defaults: depth 100, aggregation factor 10.
    #[instrument(skip(self))]
    pub async fn fetch_order_book(
        &self,
        symbol: &str,
        depth: Option<u32>,
        aggregation: Option<u32>,
    ) -> RestResult<Value> {
        let desc = RequestDescriptor::for_endpoint(endpoint::ORDER_BOOK)
            .path_param("symbol", symbol)
            .param("depth", depth.unwrap_or(DEFAULT_BOOK_DEPTH))
            .param("aggregationFactor", aggregation.unwrap_or(DEFAULT_AGGREGATION));
        self.client.execute(&desc).await
    }

    /// Get the nonce window the venue currently accepts
    #[instrument(skip(self))]
    pub async fn fetch_server_nonce(&self) -> RestResult<ServerNonce> {
        self.client
            .execute_as(&RequestDescriptor::for_endpoint(endpoint::NONCE))
            .await
    }

    /// Get server time
    #[instrument(skip(self))]
    pub async fn fetch_time(&self) -> RestResult<ServerTime> {
        self.client
            .execute_as(&RequestDescriptor::for_endpoint(endpoint::TIME))
            .await
    }
}

/// Start and end of a candle query, in milliseconds
pub fn candle_window(
    now_ms: u64,
    timeframe: Timeframe,
    since: Option<u64>,
    limit: Option<u64>,
) -> (u64, u64) {
    let limit = limit.unwrap_or(DEFAULT_CANDLE_LIMIT);
    let span = timeframe.as_millis().saturating_mul(limit);
    let start = since.unwrap_or_else(|| now_ms.saturating_sub(span));
    (start, start.saturating_add(span))
}

fn iso8601(ms: u64) -> RestResult<String> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| RestError::InvalidParameter(format!("timestamp out of range: {ms}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_window_defaults_to_500_back() {
        let now = 1_700_000_000_000;
        let (start, end) = candle_window(now, Timeframe::M1, None, None);
        assert_eq!(end, now);
        assert_eq!(end - start, 500 * 60_000);
    }

    #[test]
    fn test_candle_window_from_since() {
        let (start, end) = candle_window(0, Timeframe::H1, Some(1_000), Some(24));
        assert_eq!(start, 1_000);
        assert_eq!(end, 1_000 + 24 * 3_600_000);
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(iso8601(1_700_000_000_000).unwrap(), "2023-11-14T22:13:20.000Z");
    }
}
