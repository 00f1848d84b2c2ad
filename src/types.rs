//! Core types used throughout TriArb
//!
//! Defines currencies, raw ticker quotes, trade sides and triangle identities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency code such as `BTC` or `USDT`, always upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbol of the pair quoting `self` in `quote`, e.g. `ETH.pair_symbol(BTC) == "ETHBTC"`
    pub fn pair_symbol(&self, quote: &Currency) -> String {
        let mut symbol = String::with_capacity(self.0.len() + quote.0.len());
        symbol.push_str(&self.0);
        symbol.push_str(&quote.0);
        symbol
    }

    /// Counter currency of `symbol` relative to `self`.
    ///
    /// A symbol is read as `<code><counter>` or `<counter><code>`. When it both
    /// starts and ends with the code (`USD` in `USDTUSD`) it is read with the code
    /// as the quote asset, so every symbol has exactly one reading: `USDTUSD` is
    /// `USDT/USD` and never `USD/TUSD`.
    pub fn counter_in(&self, symbol: &str) -> Option<Currency> {
        if self.0.is_empty() {
            return None;
        }
        let code = self.0.as_str();
        symbol
            .strip_suffix(code)
            .filter(|rest| !rest.is_empty())
            .or_else(|| symbol.strip_prefix(code).filter(|rest| !rest.is_empty()))
            .map(Currency::new)
    }
}

impl From<String> for Currency {
    fn from(value: String) -> Self {
        Currency::new(value)
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order side needed to walk a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One pair's instantaneous top-of-book quote as delivered by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerQuote {
    pub symbol: String,
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
    pub volume: f64,
    pub trade_count: u64,
    /// Exchange event time in milliseconds
    pub event_time: i64,
}

impl TickerQuote {
    /// Quote with only prices set; quantities and counters zeroed
    pub fn with_prices(symbol: impl Into<String>, bid_price: f64, ask_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            bid_price,
            bid_quantity: 0.0,
            ask_price,
            ask_quantity: 0.0,
            volume: 0.0,
            trade_count: 0,
            event_time: 0,
        }
    }
}

/// Identity of a triangle: start → via_a → via_b → start
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriangleId {
    pub start: Currency,
    pub via_a: Currency,
    pub via_b: Currency,
}

impl TriangleId {
    pub fn new(
        start: impl Into<Currency>,
        via_a: impl Into<Currency>,
        via_b: impl Into<Currency>,
    ) -> Self {
        Self {
            start: start.into(),
            via_a: via_a.into(),
            via_b: via_b.into(),
        }
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} → {} → {}",
            self.start, self.via_a, self.via_b, self.start
        )
    }
}

/// Current wall clock in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
