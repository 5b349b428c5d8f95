//! Demo 1: Public Market Snapshot
//!
//! Showcases: public endpoints, order book defaults, candle windows
//!
//! Run: cargo run --bin market_snapshot -- BTCUSDC
//! Set BULLISH_ENVIRONMENT=test for the simulation venue, RUST_LOG=debug for
//! request traces.

use bullish_rest::{BullishRestClient, ClientConfig, Environment};
use bullish_types::Timeframe;
use colored::*;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "BTCUSDC".to_string());
    let environment = Environment::from_env();

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  BULLISH MARKET SNAPSHOT".cyan().bold());
    println!("  {} / {}", symbol.white().bold(), environment);
    println!("{}", "═".repeat(60).cyan());

    let client = BullishRestClient::with_config(ClientConfig::new().with_environment(environment))?;
    let market = client.market();

    let time = market.fetch_time().await?;
    println!("{} Server time {}", "✓".green(), time.datetime);

    let nonce = market.fetch_server_nonce().await?;
    println!(
        "{} Nonce window {} .. {}",
        "✓".green(),
        nonce.lower_bound,
        nonce.upper_bound
    );

    let ticker = market.fetch_ticker(&symbol).await?;
    println!(
        "\n  {:<10} {:>16}\n  {:<10} {:>16}\n  {:<10} {:>16}",
        "LAST".white().bold(),
        field(&ticker, "last"),
        "BID".white().bold(),
        field(&ticker, "bestBid"),
        "ASK".white().bold(),
        field(&ticker, "bestAsk"),
    );

    let book = market.fetch_order_book(&symbol, Some(5), None).await?;
    println!("\n  {}", "TOP OF BOOK".white().bold());
    for (side, color) in [("asks", "red"), ("bids", "green")] {
        let levels = book[side].as_array().cloned().unwrap_or_default();
        for level in levels.iter().take(5) {
            let line = format!(
                "  {:<5} {:>14} x {:<14}",
                side,
                field(level, "price"),
                field(level, "priceLevelQuantity")
            );
            println!("{}", line.color(color));
        }
    }

    let candles = market
        .fetch_ohlcv(&symbol, Timeframe::H1, None, Some(6))
        .await?;
    println!("\n  {} ({} candles)", "LAST 6 HOURS".white().bold(), candles.len());
    for candle in &candles {
        println!(
            "  {}  o {:>12}  h {:>12}  l {:>12}  c {:>12}",
            field(candle, "createdAtDatetime"),
            field(candle, "open"),
            field(candle, "high"),
            field(candle, "low"),
            field(candle, "close"),
        );
    }

    Ok(())
}

fn field(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
