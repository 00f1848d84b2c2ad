//! Stream Indexer - builds an indexed snapshot from one tick
//!
//! The snapshot is rebuilt wholesale on every tick and never merged with the
//! previous one.

use std::collections::HashMap;

use crate::types::{Currency, TickerQuote};

/// Base currencies grouped by default
pub const DEFAULT_BASE_CURRENCIES: [&str; 4] = ["BTC", "ETH", "BNB", "USDT"];

/// Full-market state for one tick
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    /// Quotes in arrival order
    quotes: Vec<TickerQuote>,
    /// Symbol -> index into `quotes` (last duplicate wins)
    by_symbol: HashMap<String, usize>,
    /// Base currency -> indices of quotes whose symbol starts or ends with it
    by_base: HashMap<Currency, Vec<usize>>,
}

impl MarketSnapshot {
    /// Quotes as received
    pub fn quotes(&self) -> &[TickerQuote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// O(1) lookup by exchange symbol, e.g. `ETHBTC`
    pub fn get(&self, symbol: &str) -> Option<&TickerQuote> {
        self.by_symbol.get(symbol).map(|&idx| &self.quotes[idx])
    }

    /// Quotes grouped under a base currency, in arrival order.
    /// Currencies that were not configured as a base yield nothing.
    pub fn markets<'a>(&'a self, base: &Currency) -> impl Iterator<Item = &'a TickerQuote> + 'a {
        self.by_base
            .get(base)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&idx| &self.quotes[idx])
    }

    /// Whether `base` was indexed as a grouping for this tick
    pub fn has_market(&self, base: &Currency) -> bool {
        self.by_base.contains_key(base)
    }
}

/// Indexes raw ticks into snapshots for a fixed, ordered list of base currencies
#[derive(Debug, Clone)]
pub struct StreamIndexer {
    base_currencies: Vec<Currency>,
}

impl StreamIndexer {
    pub fn new(base_currencies: impl IntoIterator<Item = Currency>) -> Self {
        Self {
            base_currencies: base_currencies.into_iter().collect(),
        }
    }

    pub fn base_currencies(&self) -> &[Currency] {
        &self.base_currencies
    }

    /// Build the snapshot for one tick
    pub fn index(&self, quotes: Vec<TickerQuote>) -> MarketSnapshot {
        let mut by_symbol = HashMap::with_capacity(quotes.len());
        for (idx, quote) in quotes.iter().enumerate() {
            by_symbol.insert(quote.symbol.clone(), idx);
        }

        let mut by_base = HashMap::with_capacity(self.base_currencies.len());
        for base in &self.base_currencies {
            let code = base.as_str();
            let indices: Vec<usize> = quotes
                .iter()
                .enumerate()
                .filter(|(_, q)| q.symbol.starts_with(code) || q.symbol.ends_with(code))
                .map(|(idx, _)| idx)
                .collect();
            by_base.insert(base.clone(), indices);
        }

        tracing::trace!(
            quotes = quotes.len(),
            symbols = by_symbol.len(),
            "Indexed market tick"
        );

        MarketSnapshot {
            quotes,
            by_symbol,
            by_base,
        }
    }
}

impl Default for StreamIndexer {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_CURRENCIES.iter().map(|c| Currency::new(c)))
    }
}
