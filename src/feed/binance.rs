//! Binance all-market 24h ticker payload (`!ticker@arr`)
//!
//! Prices and quantities arrive as decimal strings; OHLC and change fields are
//! ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::TickerQuote;

/// One element of the all-market ticker array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceTicker {
    /// Event time
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bid_price: String,
    #[serde(rename = "B")]
    pub bid_quantity: String,
    #[serde(rename = "a")]
    pub ask_price: String,
    #[serde(rename = "A")]
    pub ask_quantity: String,
    /// Total traded base asset volume
    #[serde(rename = "v")]
    pub volume: String,
    /// Total number of trades
    #[serde(rename = "n")]
    pub trade_count: u64,
}

impl BinanceTicker {
    /// Re-encode a quote in the exchange's wire form
    pub fn from_quote(quote: &TickerQuote) -> Self {
        Self {
            event_time: quote.event_time,
            symbol: quote.symbol.clone(),
            bid_price: quote.bid_price.to_string(),
            bid_quantity: quote.bid_quantity.to_string(),
            ask_price: quote.ask_price.to_string(),
            ask_quantity: quote.ask_quantity.to_string(),
            volume: quote.volume.to_string(),
            trade_count: quote.trade_count,
        }
    }

    pub fn to_quote(&self) -> Option<TickerQuote> {
        Some(TickerQuote {
            symbol: self.symbol.to_uppercase(),
            bid_price: parse_decimal(&self.bid_price)?,
            bid_quantity: parse_decimal(&self.bid_quantity)?,
            ask_price: parse_decimal(&self.ask_price)?,
            ask_quantity: parse_decimal(&self.ask_quantity)?,
            volume: parse_decimal(&self.volume)?,
            trade_count: self.trade_count,
            event_time: self.event_time,
        })
    }
}

fn parse_decimal(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Encode one tick as a bare ticker array, the form [`decode_tick`] accepts
pub fn encode_tick(quotes: &[TickerQuote]) -> Result<String> {
    let rows: Vec<BinanceTicker> = quotes.iter().map(BinanceTicker::from_quote).collect();
    serde_json::to_string(&rows).context("Failed to encode ticker payload")
}

/// Decode one tick. Accepts the bare array or the combined-stream envelope
/// `{"stream": "...", "data": [...]}`. Malformed rows are skipped.
pub fn decode_tick(payload: &str) -> Result<Vec<TickerQuote>> {
    let value: Value = serde_json::from_str(payload).context("Invalid ticker payload JSON")?;
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => anyhow::bail!("Ticker payload object has no data array"),
        },
        _ => anyhow::bail!("Ticker payload is neither an array nor an envelope"),
    };

    let total = rows.len();
    let quotes: Vec<TickerQuote> = rows
        .into_iter()
        .filter_map(|row| {
            let parsed = serde_json::from_value::<BinanceTicker>(row)
                .ok()
                .and_then(|t| t.to_quote());
            if parsed.is_none() {
                tracing::warn!("Skipping malformed ticker row");
            }
            parsed
        })
        .collect();

    tracing::trace!(total, decoded = quotes.len(), "Decoded ticker payload");
    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{"e":"24hrTicker","E":1746382298495,"s":"ETHBTC","p":"-0.0001","P":"-0.2",
        "w":"0.05","x":"0.05","c":"0.05","Q":"1.0","b":"0.05000000","B":"12.5","a":"0.05010000",
        "A":"3.2","o":"0.05","h":"0.051","l":"0.049","v":"1000.5","q":"50.0","O":1,"C":2,
        "F":1,"L":2,"n":489}"#;

    #[test]
    fn test_decode_array() {
        let quotes = decode_tick(&format!("[{ROW}]")).unwrap();
        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.symbol, "ETHBTC");
        assert_eq!(q.bid_price, 0.05);
        assert_eq!(q.ask_price, 0.0501);
        assert_eq!(q.bid_quantity, 12.5);
        assert_eq!(q.ask_quantity, 3.2);
        assert_eq!(q.volume, 1000.5);
        assert_eq!(q.trade_count, 489);
        assert_eq!(q.event_time, 1746382298495);
    }

    #[test]
    fn test_decode_envelope() {
        let payload = format!(r#"{{"stream":"!ticker@arr","data":[{ROW}]}}"#);
        assert_eq!(decode_tick(&payload).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let bad = ROW.replace("\"0.05000000\"", "\"n/a\"");
        let payload = format!("[{ROW},{bad},{{\"s\":\"XRPBTC\"}}]");
        assert_eq!(decode_tick(&payload).unwrap().len(), 1);
    }

    #[test]
    fn test_not_a_tick() {
        assert!(decode_tick("42").is_err());
        assert!(decode_tick("{\"result\":null}").is_err());
        assert!(decode_tick("not json").is_err());
    }

    #[test]
    fn test_encoded_tick_decodes_to_same_quotes() {
        let mut quote = TickerQuote::with_prices("ETHBTC", 0.05, 0.0501);
        quote.bid_quantity = 12.5;
        quote.trade_count = 489;
        quote.event_time = 1746382298495;

        let payload = encode_tick(&[quote.clone()]).unwrap();
        assert!(payload.contains("\"b\":\"0.05\""));
        assert_eq!(decode_tick(&payload).unwrap(), vec![quote]);
    }

    #[test]
    fn test_empty_tick() {
        assert!(decode_tick("[]").unwrap().is_empty());
    }
}
