//! Trading module - cross-tick hit counting and ready-to-trade signals
//!
//! The queue promotes a triangle only after it has repeatedly cleared the
//! queueing threshold and still clears it when re-priced on the current tick.
//! Order placement is not implemented; observers receive [`TradeEvent`]s.

mod queue;

pub use queue::{QueueParams, QueuedCandidate, TradeQueue};

use serde::Serialize;

/// Observations produced by the queue for external collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TradeEvent {
    /// Whole queue, sorted by hits descending
    QueueUpdated(Vec<QueuedCandidate>),
    /// A persistent triangle re-validated on the current tick
    NewTradeQueued {
        candidate: QueuedCandidate,
        /// Compound rate re-resolved against the current snapshot
        live_rate: f64,
        /// Milliseconds since the session started
        elapsed_ms: i64,
    },
}

impl TradeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TradeEvent::QueueUpdated(_) => "queueUpdated",
            TradeEvent::NewTradeQueued { .. } => "newTradeQueued",
        }
    }
}
