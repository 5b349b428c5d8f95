//! Demo 2: Authenticated Order History
//!
//! Showcases: HMAC login, trading account selection, cursor pagination,
//! classified venue errors
//!
//! Run: BULLISH_API_KEY=... BULLISH_API_SECRET=... cargo run --bin order_history
//! Optional: BULLISH_ENVIRONMENT=test, RUST_LOG=bullish_rest=debug

use bullish_rest::{BullishRestClient, ClientConfig, PageRequest, RestError};
use colored::*;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Stop after this many pages
const MAX_PAGES: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let symbol = std::env::args().nth(1);
    let config = ClientConfig::from_env();
    let client = BullishRestClient::with_config(config)?;

    if !client.has_credentials() {
        eprintln!(
            "{} set BULLISH_API_KEY and BULLISH_API_SECRET to run this demo",
            "✗".red()
        );
        return Ok(());
    }

    println!("{}", "═".repeat(70).cyan());
    println!("{}", "  BULLISH ORDER HISTORY".cyan().bold());
    println!("{}", "═".repeat(70).cyan());

    let account = client.account()?.select_default_account().await?;
    println!(
        "{} Logged in, using account {} ({})",
        "✓".green(),
        account.trading_account_id.white().bold(),
        account.trading_account_name.as_deref().unwrap_or("unnamed")
    );

    let balances = client.account()?.fetch_balances().await?;
    println!("\n  {}", "BALANCES".white().bold());
    for balance in &balances {
        println!(
            "  {:<8} free {:>18}  locked {:>18}",
            text(balance, "assetSymbol"),
            text(balance, "availableQuantity"),
            text(balance, "lockedQuantity")
        );
    }

    let trading = client.trading()?;
    let base = PageRequest::new().with_page_size(25);
    let mut request = base.clone();
    let mut total = 0;

    println!("\n  {}", "ORDERS".white().bold());
    for page_no in 1..=MAX_PAGES {
        let page = match trading.fetch_orders(symbol.as_deref(), &request).await {
            Ok(page) => page,
            Err(RestError::Exchange(err)) => {
                warn!(kind = %err.kind, "Venue rejected the listing");
                println!("{} {} ({:?})", "✗".red(), err.kind, err.recovery_strategy());
                break;
            }
            Err(err) => return Err(err.into()),
        };

        total += page.len();
        for order in &page.data {
            println!(
                "  {:<20} {:<10} {:<5} {:>14} @ {:<14} {}",
                text(order, "orderId"),
                text(order, "symbol"),
                text(order, "side"),
                text(order, "quantity"),
                text(order, "price"),
                text(order, "status")
            );
        }
        info!(page = page_no, rows = page.len(), "Fetched page");

        match page.next_request(&base) {
            Some(next) => request = next,
            None => break,
        }
    }

    println!("\n{} {} orders, {} login(s)", "✓".green(), total, client.login_count());
    Ok(())
}

fn text(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
