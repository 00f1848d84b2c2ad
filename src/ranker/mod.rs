//! Candidate Ranker - picks a persistent, currently profitable triangle
//!
//! Keeps a time-boxed history of observed compound rates per triangle and
//! selects the best candidate whose windowed mean still clears the minimal
//! profit rate.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use crate::scanner::Triangle;
use crate::types::TriangleId;

/// Only the top of the sorted candidate list is considered
pub const MAX_RANKED_CANDIDATES: usize = 6;

/// One historical observation of a triangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairHistoryEntry {
    pub id: TriangleId,
    pub rate: f64,
    pub recorded_at: i64,
}

/// Observations per identity, pruned by age
#[derive(Debug, Clone, Default)]
pub struct PairLedger {
    entries: HashMap<TriangleId, VecDeque<PairHistoryEntry>>,
}

impl PairLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: &TriangleId, rate: f64, recorded_at: i64) {
        self.entries
            .entry(id.clone())
            .or_default()
            .push_back(PairHistoryEntry {
                id: id.clone(),
                rate,
                recorded_at,
            });
    }

    /// Keep only entries with `recorded_at > cutoff`
    pub fn prune_before(&mut self, cutoff: i64) {
        self.entries.retain(|_, history| {
            history.retain(|e| e.recorded_at > cutoff);
            !history.is_empty()
        });
    }

    /// Arithmetic mean of retained rates, `None` without history
    pub fn mean_rate(&self, id: &TriangleId) -> Option<f64> {
        let history = self.entries.get(id)?;
        if history.is_empty() {
            return None;
        }
        Some(history.iter().map(|e| e.rate).sum::<f64>() / history.len() as f64)
    }

    /// Total number of retained observations
    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct identities with history
    pub fn identities(&self) -> usize {
        self.entries.len()
    }
}

/// Ranking thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankParams {
    /// Multiplicative factor, e.g. 1.003
    pub minimal_profit: f64,
    /// History older than this is dropped
    pub retention_window_ms: i64,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            minimal_profit: 1.003,
            retention_window_ms: 60_000,
        }
    }
}

/// Record this tick's candidates, prune old history, and pick a candidate.
///
/// `candidates` must be sorted descending by compound rate. The ledger is taken
/// and handed back so the caller owns it between ticks.
pub fn rank<'a>(
    candidates: &'a [Triangle],
    mut ledger: PairLedger,
    params: &RankParams,
    now: i64,
) -> (Option<&'a Triangle>, PairLedger) {
    for candidate in candidates {
        ledger.record(&candidate.id, candidate.compound_rate, now);
    }
    ledger.prune_before(now - params.retention_window_ms);

    let top_clears = candidates
        .first()
        .map(|top| top.compound_rate > params.minimal_profit)
        .unwrap_or(false);
    if !top_clears {
        return (None, ledger);
    }

    let selection = candidates
        .iter()
        .take(MAX_RANKED_CANDIDATES)
        .find(|candidate| {
            ledger
                .mean_rate(&candidate.id)
                .map(|mean| mean > params.minimal_profit)
                .unwrap_or(false)
        });

    (selection, ledger)
}

/// Stateful wrapper that owns the ledger for one session
#[derive(Debug, Clone, Default)]
pub struct CandidateRanker {
    params: RankParams,
    ledger: PairLedger,
}

impl CandidateRanker {
    pub fn new(params: RankParams) -> Self {
        Self {
            params,
            ledger: PairLedger::new(),
        }
    }

    pub fn params(&self) -> &RankParams {
        &self.params
    }

    pub fn ledger(&self) -> &PairLedger {
        &self.ledger
    }

    pub fn rank<'a>(&mut self, candidates: &'a [Triangle], now: i64) -> Option<&'a Triangle> {
        let ledger = std::mem::take(&mut self.ledger);
        let (selection, ledger) = rank(candidates, ledger, &self.params, now);
        self.ledger = ledger;

        if let Some(pick) = selection {
            tracing::debug!(
                triangle = %pick.id,
                rate = pick.compound_rate,
                mean = self.ledger.mean_rate(&pick.id).unwrap_or_default(),
                "Ranked candidate selected"
            );
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{resolve_cycle, StreamIndexer};
    use crate::types::TickerQuote;

    /// A real triangle from a tiny market, with its compound rate overridden
    fn triangle(via_b: &str, rate: f64) -> Triangle {
        let snap = StreamIndexer::default().index(vec![
            TickerQuote::with_prices("BTCUSDT", 60000.0, 60010.0),
            TickerQuote::with_prices(format!("{via_b}BTC"), 0.05, 0.0501),
            TickerQuote::with_prices(format!("{via_b}USDT"), 3000.0, 3010.0),
        ]);
        let mut tri = resolve_cycle(&snap, &TriangleId::new("USDT", "BTC", via_b), 0).unwrap();
        tri.compound_rate = rate;
        tri
    }

    fn params() -> RankParams {
        RankParams {
            minimal_profit: 1.003,
            retention_window_ms: 10_000,
        }
    }

    #[test]
    fn test_current_tick_counts_as_history() {
        // Recording happens before selection, so the first tick already has one sample
        let candidates = vec![triangle("ETH", 1.01)];
        let (pick, ledger) = rank(&candidates, PairLedger::new(), &params(), 1_000);
        assert_eq!(pick.map(|t| t.id.clone()), Some(candidates[0].id.clone()));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_zero_history_selects_nothing() {
        // A zero-length window prunes everything, including this tick's samples
        let candidates = vec![triangle("ETH", 1.01)];
        let params = RankParams {
            minimal_profit: 1.003,
            retention_window_ms: 0,
        };
        let (pick, ledger) = rank(&candidates, PairLedger::new(), &params, 1_000);
        assert!(pick.is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_mean_of_identical_rates() {
        let id = TriangleId::new("USDT", "BTC", "ETH");
        let mut ledger = PairLedger::new();
        for t in 0..5 {
            ledger.record(&id, 1.0042, 1_000 + t);
        }
        assert_eq!(ledger.mean_rate(&id), Some(1.0042));
    }

    #[test]
    fn test_pruned_entries_do_not_contribute() {
        let id = TriangleId::new("USDT", "BTC", "ETH");
        let mut ledger = PairLedger::new();
        ledger.record(&id, 0.5, 0);
        ledger.record(&id, 1.01, 9_000);

        ledger.prune_before(10_000 - 10_000);
        assert_eq!(ledger.mean_rate(&id), Some(1.01));

        ledger.prune_before(9_000);
        assert_eq!(ledger.mean_rate(&id), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_top_below_minimal_profit_selects_nothing() {
        let candidates = vec![triangle("ETH", 1.003), triangle("BNB", 1.001)];
        let (pick, ledger) = rank(&candidates, PairLedger::new(), &params(), 1_000);
        assert!(pick.is_none());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_weak_history_skips_to_next_candidate() {
        let eth = triangle("ETH", 1.02);
        let bnb = triangle("BNB", 1.01);

        let mut ledger = PairLedger::new();
        // ETH has been losing for a while, BNB has been consistently profitable
        for t in 0..4 {
            ledger.record(&eth.id, 0.98, 5_000 + t);
            ledger.record(&bnb.id, 1.01, 5_000 + t);
        }

        let candidates = vec![eth, bnb];
        let (pick, _) = rank(&candidates, ledger, &params(), 6_000);
        assert_eq!(pick.map(|t| t.id.via_b.as_str()), Some("BNB"));
    }

    #[test]
    fn test_scan_capped_at_top_six() {
        let mut ledger = PairLedger::new();
        let mut candidates = Vec::new();
        for (i, code) in ["A1", "A2", "A3", "A4", "A5", "A6", "A7"].iter().enumerate() {
            let tri = triangle(code, 1.02 - i as f64 * 0.001);
            for t in 0..20 {
                ledger.record(&tri.id, 0.9, 5_000 + t);
            }
            candidates.push(tri);
        }
        // Only the 7th candidate has a good history
        for t in 0..100 {
            ledger.record(&candidates[6].id, 1.1, 5_000 + t);
        }

        let (pick, _) = rank(&candidates, ledger, &params(), 6_000);
        assert!(pick.is_none());
    }

    #[test]
    fn test_ranker_threads_ledger_across_ticks() {
        let mut ranker = CandidateRanker::new(params());
        let candidates = vec![triangle("ETH", 1.01)];

        ranker.rank(&candidates, 1_000);
        ranker.rank(&candidates, 2_000);
        assert_eq!(ranker.ledger().len(), 2);

        // First sample falls out of the window
        ranker.rank(&[], 11_500);
        assert_eq!(ranker.ledger().len(), 1);
        assert!(ranker.rank(&[], 11_600).is_none());
    }
}
