//! Triangle Searcher - enumerates closed 3-leg cycles
//!
//! For a start currency and each configured via-currency, finds every
//! `start -> via_a -> via_b -> start` cycle quoted in the snapshot and ranks
//! them by compound rate. Cycle length is fixed at three legs.

use serde::Serialize;
use std::collections::HashSet;

use crate::market::{resolve, resolve_cycle, DirectedLeg, MarketSnapshot};
use crate::types::{Currency, TriangleId};

/// A closed 3-leg conversion cycle observed on one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triangle {
    pub id: TriangleId,
    /// start -> via_a
    pub a: DirectedLeg,
    /// via_a -> via_b
    pub b: DirectedLeg,
    /// via_b -> start
    pub c: DirectedLeg,
    /// `a.rate * b.rate * c.rate`; above 1.0 before fees means profit
    pub compound_rate: f64,
    /// Exchange event time of leg `a`
    pub event_time: i64,
    /// Local wall clock when the cycle was resolved
    pub observed_at: i64,
}

impl Triangle {
    /// Pre-fee profit in percent
    pub fn profit_pct(&self) -> f64 {
        (self.compound_rate - 1.0) * 100.0
    }

    pub fn legs(&self) -> [&DirectedLeg; 3] {
        [&self.a, &self.b, &self.c]
    }
}

/// Stable sort, highest compound rate first
pub fn sort_by_rate_desc(candidates: &mut [Triangle]) {
    candidates.sort_by(|x, y| y.compound_rate.total_cmp(&x.compound_rate));
}

/// Searches triangles from one start currency through a list of via-currencies
#[derive(Debug, Clone)]
pub struct TriangleSearcher {
    start: Currency,
    via_paths: Vec<Currency>,
}

impl TriangleSearcher {
    pub fn new(start: Currency, via_paths: impl IntoIterator<Item = Currency>) -> Self {
        Self {
            start,
            via_paths: via_paths.into_iter().collect(),
        }
    }

    pub fn start(&self) -> &Currency {
        &self.start
    }

    pub fn via_paths(&self) -> &[Currency] {
        &self.via_paths
    }

    /// All candidates across the configured via paths, sorted descending
    pub fn search(&self, snapshot: &MarketSnapshot, now: i64) -> Vec<Triangle> {
        let mut matches = Vec::new();
        for via_a in &self.via_paths {
            matches.extend(search_via_path(snapshot, &self.start, via_a, now));
        }
        sort_by_rate_desc(&mut matches);
        matches
    }
}

/// Candidates for one seed pair `(start, via_a)`, sorted descending.
///
/// Each `(start, via_a, via_b)` identity is emitted at most once per call, even
/// when the exchange lists the `via_a`/`via_b` pair in both directions, so a
/// triangle counts one queue hit per tick. The middle leg must be priced on the
/// quote `via_b` was read from.
pub fn search_via_path(
    snapshot: &MarketSnapshot,
    start: &Currency,
    via_a: &Currency,
    now: i64,
) -> Vec<Triangle> {
    // Currencies that trade directly against `start`. `via_a` itself is removed
    // so that start -> via_a -> start never passes for a triangle.
    let mut start_counters: HashSet<Currency> = snapshot
        .markets(start)
        .filter_map(|q| start.counter_in(&q.symbol))
        .collect();
    start_counters.remove(via_a);

    let mut seen: HashSet<Currency> = HashSet::new();
    let mut matches = Vec::new();

    for quote in snapshot.markets(via_a) {
        let Some(via_b) = via_a.counter_in(&quote.symbol) else {
            continue;
        };
        if &via_b == start || !start_counters.contains(&via_b) || seen.contains(&via_b) {
            continue;
        }

        if let Err(e) = resolve(snapshot, &via_b, start) {
            tracing::trace!(from = %via_b, to = %start, error = %e, "Closing leg unresolved");
            continue;
        }

        let id = TriangleId {
            start: start.clone(),
            via_a: via_a.clone(),
            via_b: via_b.clone(),
        };
        match resolve_cycle(snapshot, &id, now) {
            Ok(triangle) if triangle.b.symbol != quote.symbol => {
                tracing::trace!(
                    triangle = %id,
                    read_from = %quote.symbol,
                    priced_on = %triangle.b.symbol,
                    "Middle leg priced on another market"
                );
            }
            Ok(triangle) => {
                seen.insert(via_b);
                matches.push(triangle);
            }
            Err(e) => {
                tracing::trace!(triangle = %id, error = %e, "Cycle unresolved");
            }
        }
    }

    sort_by_rate_desc(&mut matches);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::StreamIndexer;
    use crate::types::TickerQuote;

    fn snapshot_with(bases: &[&str], quotes: &[(&str, f64, f64)]) -> MarketSnapshot {
        StreamIndexer::new(bases.iter().map(|c| Currency::new(c))).index(
            quotes
                .iter()
                .map(|(s, bid, ask)| TickerQuote::with_prices(*s, *bid, *ask))
                .collect(),
        )
    }

    fn cur(code: &str) -> Currency {
        Currency::new(code)
    }

    #[test]
    fn test_single_triangle_found() {
        let snap = snapshot_with(
            &["BTC", "ETH", "BNB", "USDT"],
            &[
                ("BTCUSDT", 60000.0, 60010.0),
                ("ETHBTC", 0.05, 0.0501),
                ("ETHUSDT", 3000.0, 3010.0),
            ],
        );
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, TriangleId::new("USDT", "BTC", "ETH"));
    }

    #[test]
    fn test_legs_close_and_output_sorted() {
        let snap = snapshot_with(
            &["BTC", "ETH", "BNB", "USDT"],
            &[
                ("BTCUSDT", 60000.0, 60010.0),
                ("ETHBTC", 0.05, 0.0501),
                ("ETHUSDT", 3000.0, 3010.0),
                ("BNBBTC", 0.009, 0.0091),
                ("BNBUSDT", 540.0, 541.0),
                ("XRPBTC", 0.00001, 0.0000101),
                ("XRPUSDT", 0.6, 0.61),
                ("BNBETH", 0.18, 0.181),
            ],
        );
        let searcher = TriangleSearcher::new(cur("USDT"), vec![cur("BTC"), cur("ETH")]);
        let found = searcher.search(&snap, 0);

        assert!(found.len() >= 4);
        for tri in &found {
            assert_eq!(tri.a.to, tri.b.from);
            assert_eq!(tri.b.to, tri.c.from);
            assert_eq!(tri.c.to, tri.a.from);
            assert_eq!(tri.a.from, cur("USDT"));
            assert!(tri.compound_rate > 0.0);
        }
        for pair in found.windows(2) {
            assert!(pair[0].compound_rate >= pair[1].compound_rate);
        }
    }

    #[test]
    fn test_two_leg_loop_is_not_a_triangle() {
        // USDT -> BTC -> USDT would need via_b == via_a
        let snap = snapshot_with(
            &["BTC", "USDT"],
            &[("BTCUSDT", 60000.0, 60010.0), ("USDTBTC", 0.0000166, 0.0000167)],
        );
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);
        assert!(found.is_empty());
    }

    #[test]
    fn test_unreachable_closing_leg_is_skipped() {
        // ETH pairs with USDT only through a market that is not quoted on this tick
        let snap = snapshot_with(
            &["BTC", "USDT"],
            &[("BTCUSDT", 60000.0, 60010.0), ("ETHBTC", 0.05, 0.0501)],
        );
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);
        assert!(found.is_empty());
    }

    #[test]
    fn test_both_listing_directions_yield_one_cycle() {
        let snap = snapshot_with(
            &["BTC", "USDT"],
            &[
                ("BTCUSDT", 60000.0, 60010.0),
                ("ETHBTC", 0.05, 0.0501),
                ("BTCETH", 19.9, 20.1),
                ("ETHUSDT", 3000.0, 3010.0),
            ],
        );
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_substring_currency_codes() {
        // USD is a prefix of USDT and USDC; none of these may collapse into a 2-leg loop
        let snap = snapshot_with(
            &["USD", "USDT", "USDC", "BTC"],
            &[
                ("USDTUSD", 0.999, 1.001),
                ("USDCUSD", 0.998, 1.0),
                ("USDCUSDT", 0.999, 1.0),
                ("BTCUSD", 60000.0, 60010.0),
                ("BTCUSDT", 60005.0, 60015.0),
            ],
        );

        let found = search_via_path(&snap, &cur("USD"), &cur("USDT"), 0);
        for tri in &found {
            assert_ne!(tri.id.via_b, tri.id.via_a);
            assert_ne!(tri.id.via_b, tri.id.start);
            assert_ne!(tri.id.via_a, tri.id.start);
        }
        let ids: Vec<TriangleId> = found.iter().map(|t| t.id.clone()).collect();
        assert!(ids.contains(&TriangleId::new("USD", "USDT", "USDC")));
        assert!(ids.contains(&TriangleId::new("USD", "USDT", "BTC")));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_overlapping_codes_do_not_reuse_a_market() {
        // USDTUSD is USDT/USD; it must not also price a USD -> TUSD leg
        let snap = snapshot_with(
            &["BTC", "USD"],
            &[
                ("USDTUSD", 0.999, 1.001),
                ("TUSDBTC", 0.0000166, 0.0000167),
                ("USDTBTC", 0.0000166, 0.0000167),
                ("BTCUSD", 60000.0, 60010.0),
            ],
        );

        let found = search_via_path(&snap, &cur("BTC"), &cur("USD"), 0);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, TriangleId::new("BTC", "USD", "USDT"));
        assert_eq!(found[0].b.symbol, "USDTUSD");
        assert_eq!(found[0].b.to, cur("USDT"));
    }

    #[test]
    fn test_middle_leg_priced_on_source_quote() {
        let snap = snapshot_with(
            &["BTC", "USDT"],
            &[
                ("BTCUSDT", 60000.0, 60010.0),
                ("BTCETH", 19.9, 20.1),
                ("ETHBTC", 0.05, 0.0501),
                ("ETHUSDT", 3000.0, 3010.0),
            ],
        );
        // BTCETH is listed first but BTC -> ETH resolves on ETHBTC
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].b.symbol, "ETHBTC");
    }

    #[test]
    fn test_unconfigured_base_yields_nothing() {
        let snap = snapshot_with(
            &["BTC"],
            &[
                ("BTCUSDT", 60000.0, 60010.0),
                ("ETHBTC", 0.05, 0.0501),
                ("ETHUSDT", 3000.0, 3010.0),
            ],
        );
        let found = search_via_path(&snap, &cur("USDT"), &cur("BTC"), 0);
        assert!(found.is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = snapshot_with(&["BTC", "USDT"], &[]);
        let searcher = TriangleSearcher::new(cur("USDT"), vec![cur("BTC")]);
        assert!(searcher.search(&snap, 0).is_empty());
    }
}
