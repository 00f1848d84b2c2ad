//! Rate Resolver - directional legs priced from a single quoted pair
//!
//! Exchanges quote a pair once, as `BASEQUOTE`. Going `from -> to`:
//! - `to+from` is quoted: we buy `to` paying `from`, priced at the ask (`flipped = false`)
//! - `from+to` is quoted: we sell `from` for `to`, priced at `1 / bid` (`flipped = true`)

use serde::Serialize;

use crate::error::{ArbError, Result};
use crate::market::MarketSnapshot;
use crate::scanner::Triangle;
use crate::types::{Currency, Side, TickerQuote, TriangleId};

/// One resolved conversion step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectedLeg {
    pub from: Currency,
    pub to: Currency,
    pub symbol: String,
    pub flipped: bool,
    /// Ask when not flipped, `1 / bid` when flipped
    pub rate: f64,
    pub side: Side,
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
    pub volume: f64,
    pub trade_count: u64,
    pub event_time: i64,
}

impl DirectedLeg {
    fn from_quote(quote: &TickerQuote, from: &Currency, to: &Currency, flipped: bool) -> Self {
        let (rate, side) = if flipped {
            (1.0 / quote.bid_price, Side::Sell)
        } else {
            (quote.ask_price, Side::Buy)
        };

        Self {
            from: from.clone(),
            to: to.clone(),
            symbol: quote.symbol.clone(),
            flipped,
            rate,
            side,
            bid_price: quote.bid_price,
            bid_quantity: quote.bid_quantity,
            ask_price: quote.ask_price,
            ask_quantity: quote.ask_quantity,
            volume: quote.volume,
            trade_count: quote.trade_count,
            event_time: quote.event_time,
        }
    }
}

/// Resolve the `from -> to` leg against the snapshot
pub fn resolve(snapshot: &MarketSnapshot, from: &Currency, to: &Currency) -> Result<DirectedLeg> {
    let leg = if let Some(quote) = snapshot.get(&to.pair_symbol(from)) {
        DirectedLeg::from_quote(quote, from, to, false)
    } else if let Some(quote) = snapshot.get(&from.pair_symbol(to)) {
        DirectedLeg::from_quote(quote, from, to, true)
    } else {
        return Err(ArbError::NoMarketForPair {
            from: from.clone(),
            to: to.clone(),
        });
    };

    if !leg.rate.is_finite() || leg.rate <= 0.0 {
        return Err(ArbError::InvalidRate {
            symbol: leg.symbol,
            rate: leg.rate,
        });
    }

    Ok(leg)
}

/// Resolve all three legs of `id` and compound them
pub fn resolve_cycle(snapshot: &MarketSnapshot, id: &TriangleId, observed_at: i64) -> Result<Triangle> {
    let a = resolve(snapshot, &id.start, &id.via_a)?;
    let b = resolve(snapshot, &id.via_a, &id.via_b)?;
    let c = resolve(snapshot, &id.via_b, &id.start)?;

    let compound_rate = a.rate * b.rate * c.rate;
    if !compound_rate.is_finite() || compound_rate <= 0.0 {
        return Err(ArbError::InvalidRate {
            symbol: format!("{}/{}/{}", a.symbol, b.symbol, c.symbol),
            rate: compound_rate,
        });
    }

    Ok(Triangle {
        id: id.clone(),
        event_time: a.event_time,
        observed_at,
        compound_rate,
        a,
        b,
        c,
    })
}
