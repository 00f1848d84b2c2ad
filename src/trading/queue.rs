//! Trade Queue - hit counting per triangle identity across ticks

use serde::Serialize;
use std::collections::HashMap;

use crate::market::{resolve_cycle, MarketSnapshot};
use crate::scanner::Triangle;
use crate::trading::TradeEvent;
use crate::types::TriangleId;

/// Queue thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueParams {
    /// Multiplicative factor a compound rate must reach to be queued and to be acted on
    pub min_queue_threshold: f64,
    /// Hits required before an entry is re-validated
    pub min_hits_threshold: u32,
    /// Evict entries whose last hit is older than this. `None` keeps them for the session.
    pub retention_ms: Option<i64>,
}

impl QueueParams {
    /// Build from a percentage (3 -> 1.03). A missing or zero percentage disables
    /// the rate gate entirely.
    pub fn from_percentage(min_queue_pct: Option<f64>, min_hits_threshold: u32) -> Self {
        let min_queue_threshold = match min_queue_pct {
            Some(pct) if pct != 0.0 => 1.0 + pct / 100.0,
            _ => 0.0,
        };
        Self {
            min_queue_threshold,
            min_hits_threshold,
            retention_ms: None,
        }
    }

    pub fn with_retention(mut self, retention_ms: Option<i64>) -> Self {
        self.retention_ms = retention_ms;
        self
    }
}

impl Default for QueueParams {
    fn default() -> Self {
        Self::from_percentage(Some(3.0), 5)
    }
}

/// Cross-tick aggregation of one triangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedCandidate {
    /// The triangle as first queued
    triangle: Triangle,
    /// Every qualifying compound rate, oldest first
    rates: Vec<f64>,
    hits: u32,
    first_seen_at: i64,
    last_hit_at: i64,
}

impl QueuedCandidate {
    fn new(triangle: &Triangle, now: i64) -> Self {
        Self {
            triangle: triangle.clone(),
            rates: Vec::new(),
            hits: 0,
            first_seen_at: now,
            last_hit_at: now,
        }
    }

    fn hit(&mut self, rate: f64, now: i64) {
        self.hits += 1;
        self.rates.push(rate);
        self.last_hit_at = now;
    }

    pub fn id(&self) -> &TriangleId {
        &self.triangle.id
    }

    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn first_seen_at(&self) -> i64 {
        self.first_seen_at
    }

    pub fn last_hit_at(&self) -> i64 {
        self.last_hit_at
    }

    pub fn mean_rate(&self) -> f64 {
        if self.rates.is_empty() {
            return 0.0;
        }
        self.rates.iter().sum::<f64>() / self.rates.len() as f64
    }
}

/// Hit-count queue owned by one session
#[derive(Debug, Clone)]
pub struct TradeQueue {
    params: QueueParams,
    started_at: i64,
    /// Insertion order, which is also the tie-break among equal hits
    entries: Vec<QueuedCandidate>,
    index: HashMap<TriangleId, usize>,
}

impl TradeQueue {
    pub fn new(params: QueueParams, started_at: i64) -> Self {
        Self {
            params,
            started_at,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn params(&self) -> &QueueParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &TriangleId) -> Option<&QueuedCandidate> {
        self.index.get(id).map(|&idx| &self.entries[idx])
    }

    /// Milliseconds between session start and `now`
    pub fn elapsed(&self, now: i64) -> i64 {
        now - self.started_at
    }

    /// Count this tick's qualifying candidates and emit queue observations.
    ///
    /// `candidates` must be sorted descending by compound rate: the walk stops at
    /// the first one below the queueing threshold.
    pub fn update(
        &mut self,
        snapshot: &MarketSnapshot,
        candidates: &[Triangle],
        now: i64,
    ) -> Vec<TradeEvent> {
        let mut counted = 0usize;
        for candidate in candidates {
            if candidate.compound_rate < self.params.min_queue_threshold {
                break;
            }
            self.upsert(candidate, now);
            counted += 1;
        }
        self.evict_stale(now);

        if self.entries.is_empty() {
            return Vec::new();
        }

        let sorted = self.sorted_by_hits();
        tracing::debug!(
            counted,
            queued = sorted.len(),
            top_hits = sorted.first().map(QueuedCandidate::hits).unwrap_or_default(),
            "Trade queue updated"
        );

        let mut events = self.process_queue(&sorted, snapshot, now);
        events.insert(0, TradeEvent::QueueUpdated(sorted));
        events
    }

    /// Re-validate persistent entries against the current snapshot.
    ///
    /// `queue` must be sorted descending by hits: the walk stops at the first
    /// entry below the hit threshold.
    pub fn process_queue(
        &self,
        queue: &[QueuedCandidate],
        snapshot: &MarketSnapshot,
        now: i64,
    ) -> Vec<TradeEvent> {
        let mut events = Vec::new();
        for entry in queue {
            if entry.hits < self.params.min_hits_threshold {
                break;
            }

            // Never trust the cached rate; re-price on this tick.
            match resolve_cycle(snapshot, entry.id(), now) {
                Ok(live) if live.compound_rate >= self.params.min_queue_threshold => {
                    tracing::info!(
                        triangle = %entry.id(),
                        hits = entry.hits,
                        live_rate = live.compound_rate,
                        elapsed_ms = self.elapsed(now),
                        "New trade queued"
                    );
                    events.push(TradeEvent::NewTradeQueued {
                        candidate: entry.clone(),
                        live_rate: live.compound_rate,
                        elapsed_ms: self.elapsed(now),
                    });
                }
                Ok(live) => {
                    tracing::trace!(
                        triangle = %entry.id(),
                        live_rate = live.compound_rate,
                        "Live rate below queue threshold"
                    );
                }
                Err(e) => {
                    tracing::trace!(triangle = %entry.id(), error = %e, "Live re-validation failed");
                }
            }
        }
        events
    }

    /// Entries sorted by hits descending, ties in first-queued order
    pub fn sorted_by_hits(&self) -> Vec<QueuedCandidate> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|x, y| y.hits.cmp(&x.hits));
        sorted
    }

    fn upsert(&mut self, candidate: &Triangle, now: i64) {
        let idx = match self.index.get(&candidate.id) {
            Some(&idx) => idx,
            None => {
                self.entries.push(QueuedCandidate::new(candidate, now));
                let idx = self.entries.len() - 1;
                self.index.insert(candidate.id.clone(), idx);
                idx
            }
        };
        self.entries[idx].hit(candidate.compound_rate, now);
    }

    fn evict_stale(&mut self, now: i64) {
        let Some(retention) = self.params.retention_ms else {
            return;
        };
        let before = self.entries.len();
        self.entries.retain(|e| now - e.last_hit_at <= retention);
        if self.entries.len() != before {
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(idx, e)| (e.id().clone(), idx))
                .collect();
            tracing::debug!(evicted = before - self.entries.len(), "Evicted stale queue entries");
        }
    }
}
