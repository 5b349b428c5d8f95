//! Side, OrderType, TimeInForce, and Timeframe enums

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl Side {
    /// Returns the side as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" | "buy" => Ok(Self::Buy),
            "SELL" | "sell" => Ok(Self::Sell),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// Order types accepted by the order entry endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Limit order - executes at specified price or better
    Limit,
    /// Market order - executes immediately at best available price
    Market,
    /// Stop-limit order
    StopLimit,
}

impl OrderType {
    /// Returns the order type as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Limit => "LIMIT",
            Self::Market => "MARKET",
            Self::StopLimit => "STOP_LIMIT",
        }
    }

    /// Returns true if the order type needs a limit price
    pub fn requires_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }
}

impl FromStr for OrderType {
    type Err = String;

    /// Accepts the venue spelling as well as the common aliases
    /// (`LMT`, `MKT`, `stop+limit`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LMT" | "LIMIT" | "limit" => Ok(Self::Limit),
            "MKT" | "MARKET" | "market" => Ok(Self::Market),
            "STOP_LIMIT" | "stop_limit" | "stop+limit" => Ok(Self::StopLimit),
            other => Err(format!("unknown order type: {other}")),
        }
    }
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeInForce {
    /// Good till cancelled
    #[default]
    #[serde(rename = "GTC")]
    Gtc,
    /// Fill or kill
    #[serde(rename = "FOK")]
    Fok,
    /// Immediate or cancel
    #[serde(rename = "IOC")]
    Ioc,
}

impl TimeInForce {
    /// Returns the time in force as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gtc => "GTC",
            Self::Fok => "FOK",
            Self::Ioc => "IOC",
        }
    }
}

/// Candle widths supported by the candle endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Returns the `timeBucket` value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H6 => "6h",
            Self::H12 => "12h",
            Self::D1 => "1d",
        }
    }

    /// Width of one candle in seconds
    pub fn as_secs(&self) -> u64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
            Self::H6 => 21_600,
            Self::H12 => 43_200,
            Self::D1 => 86_400,
        }
    }

    /// Width of one candle in milliseconds
    pub fn as_millis(&self) -> u64 {
        self.as_secs() * 1_000
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            "6h" => Ok(Self::H6),
            "12h" => Ok(Self::H12),
            "1d" => Ok(Self::D1),
            other => Err(format!("timeframe '{other}' is not supported")),
        }
    }
}
