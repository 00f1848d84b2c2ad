//! Arbitrage session - one tick at a time through indexer, searcher, ranker and queue

mod observer;

pub use observer::{ChannelObserver, SessionObserver};

#[cfg(test)]
pub use observer::MockSessionObserver;

use anyhow::Result;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ArbError;
use crate::feed::TickSource;
use crate::market::StreamIndexer;
use crate::ranker::CandidateRanker;
use crate::scanner::{Triangle, TriangleSearcher};
use crate::trading::{TradeEvent, TradeQueue};
use crate::types::{now_ms, TickerQuote};

/// Result of processing one tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Sorted descending by compound rate
    pub candidates: Vec<Triangle>,
    pub selection: Option<Triangle>,
    pub events: Vec<TradeEvent>,
}

/// Running totals for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub ticks: u64,
    pub candidates: u64,
    pub selections: u64,
    pub trades_queued: u64,
}

pub struct ArbitrageSession {
    session_id: Uuid,
    started_at: i64,
    indexer: StreamIndexer,
    searcher: TriangleSearcher,
    ranker: CandidateRanker,
    queue: TradeQueue,
    observers: Vec<Box<dyn SessionObserver>>,
    stats: SessionStats,
}

impl ArbitrageSession {
    /// Build a session from validated configuration, starting now
    pub fn new(config: &AppConfig) -> std::result::Result<Self, ArbError> {
        config.validate()?;
        let started_at = now_ms();
        Ok(Self::from_parts(
            StreamIndexer::new(config.base_currencies()),
            TriangleSearcher::new(config.start_currency(), config.via_paths()),
            CandidateRanker::new(config.rank_params()),
            TradeQueue::new(config.queue_params(), started_at),
            started_at,
        ))
    }

    pub fn from_parts(
        indexer: StreamIndexer,
        searcher: TriangleSearcher,
        ranker: CandidateRanker,
        queue: TradeQueue,
        started_at: i64,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at,
            indexer,
            searcher,
            ranker,
            queue,
            observers: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn ranker(&self) -> &CandidateRanker {
        &self.ranker
    }

    pub fn queue(&self) -> &TradeQueue {
        &self.queue
    }

    /// Run one full-market tick observed at `now` (epoch ms)
    pub fn process_tick(&mut self, quotes: Vec<TickerQuote>, now: i64) -> TickOutcome {
        for observer in self.observers.iter_mut() {
            observer.on_tick(&quotes);
        }

        let snapshot = self.indexer.index(quotes);
        let candidates = self.searcher.search(&snapshot, now);
        let selection = self.ranker.rank(&candidates, now).cloned();
        let events = self.queue.update(&snapshot, &candidates, now);

        self.stats.ticks += 1;
        self.stats.candidates += candidates.len() as u64;
        if selection.is_some() {
            self.stats.selections += 1;
        }
        self.stats.trades_queued += events
            .iter()
            .filter(|e| matches!(e, TradeEvent::NewTradeQueued { .. }))
            .count() as u64;

        debug!(
            session = %self.session_id,
            markets = snapshot.len(),
            candidates = candidates.len(),
            best_rate = candidates.first().map(|t| t.compound_rate),
            selected = selection.as_ref().map(|t| t.id.to_string()),
            events = events.len(),
            "Tick processed"
        );

        for observer in self.observers.iter_mut() {
            observer.on_candidates(&candidates, selection.as_ref());
            for event in &events {
                observer.on_trade_event(event);
            }
        }

        TickOutcome {
            candidates,
            selection,
            events,
        }
    }

    /// Pull ticks from `source` until it ends
    pub async fn run<S: TickSource + ?Sized>(&mut self, source: &mut S) -> Result<SessionStats> {
        info!(
            session = %self.session_id,
            source = source.name(),
            start = %self.searcher.start(),
            "Arbitrage session started"
        );

        while let Some(quotes) = source.next_tick().await? {
            self.process_tick(quotes, now_ms());
        }

        info!(
            session = %self.session_id,
            ticks = self.stats.ticks,
            candidates = self.stats.candidates,
            selections = self.stats.selections,
            trades_queued = self.stats.trades_queued,
            queued = self.queue.len(),
            ledger_identities = self.ranker.ledger().identities(),
            elapsed_ms = self.queue.elapsed(now_ms()),
            "Arbitrage session finished"
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChannelSource;
    use crate::ranker::RankParams;
    use crate::trading::QueueParams;
    use crate::types::Currency;
    use tokio::sync::mpsc;

    fn tick() -> Vec<TickerQuote> {
        vec![
            TickerQuote::with_prices("BTCUSDT", 60000.0, 60010.0),
            TickerQuote::with_prices("ETHBTC", 0.05, 0.0501),
            TickerQuote::with_prices("ETHUSDT", 3000.0, 3010.0),
        ]
    }

    fn session(min_hits: u32) -> ArbitrageSession {
        ArbitrageSession::from_parts(
            StreamIndexer::default(),
            TriangleSearcher::new(Currency::new("USDT"), [Currency::new("BTC")]),
            CandidateRanker::new(RankParams {
                minimal_profit: 1.001,
                retention_window_ms: 60_000,
            }),
            TradeQueue::new(QueueParams::from_percentage(Some(0.1), min_hits), 0),
            0,
        )
    }

    #[test]
    fn test_process_tick_runs_all_stages() {
        let mut s = session(5);
        let outcome = s.process_tick(tick(), 1_000);

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(
            outcome.selection.as_ref().map(|t| t.id.clone()),
            Some(crate::types::TriangleId::new("USDT", "BTC", "ETH"))
        );
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].name(), "queueUpdated");
        assert_eq!(s.stats().ticks, 1);
        assert_eq!(s.stats().selections, 1);
    }

    #[test]
    fn test_observers_notified_per_tick() {
        let mut s = session(2);
        let mut observer = MockSessionObserver::new();
        observer
            .expect_on_tick()
            .withf(|quotes| quotes.len() == 3)
            .times(2)
            .return_const(());
        observer
            .expect_on_candidates()
            .withf(|candidates, selection| candidates.len() == 1 && selection.is_some())
            .times(2)
            .return_const(());
        // tick 1: queueUpdated; tick 2: queueUpdated + newTradeQueued
        observer
            .expect_on_trade_event()
            .times(3)
            .return_const(());
        s.add_observer(Box::new(observer));

        s.process_tick(tick(), 1_000);
        let outcome = s.process_tick(tick(), 2_000);

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.events[1].name(), "newTradeQueued");
        assert_eq!(s.stats().trades_queued, 1);
    }

    #[test]
    fn test_empty_tick_is_noop() {
        let mut s = session(5);
        let mut observer = MockSessionObserver::new();
        observer
            .expect_on_tick()
            .withf(|quotes| quotes.is_empty())
            .times(1)
            .return_const(());
        observer
            .expect_on_candidates()
            .withf(|candidates, selection| candidates.is_empty() && selection.is_none())
            .times(1)
            .return_const(());
        observer.expect_on_trade_event().never();
        s.add_observer(Box::new(observer));

        let outcome = s.process_tick(Vec::new(), 1_000);
        assert!(outcome.candidates.is_empty());
        assert!(outcome.events.is_empty());
        assert!(s.queue().is_empty());
    }

    #[tokio::test]
    async fn test_run_until_source_ends() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = ChannelSource::new("test", rx);
        for _ in 0..3 {
            tx.send(tick()).await.unwrap();
        }
        drop(tx);

        let mut s = session(2);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        s.add_observer(Box::new(ChannelObserver::new(event_tx)));

        let stats = s.run(&mut source).await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.trades_queued, 2);

        let mut names = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            names.push(event.name());
        }
        assert_eq!(
            names,
            vec![
                "queueUpdated",
                "queueUpdated",
                "newTradeQueued",
                "queueUpdated",
                "newTradeQueued"
            ]
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut cfg = AppConfig::defaults().unwrap();
        cfg.arbitrage.via_paths.clear();
        assert!(matches!(
            ArbitrageSession::new(&cfg),
            Err(ArbError::Configuration(_))
        ));
    }
}
