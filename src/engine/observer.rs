//! Session observers

use tokio::sync::mpsc::UnboundedSender;

use crate::scanner::Triangle;
use crate::trading::TradeEvent;
use crate::types::TickerQuote;

/// Receives per-tick results from an [`ArbitrageSession`](super::ArbitrageSession)
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send {
    /// Raw quotes of the current tick, before indexing
    fn on_tick(&mut self, _quotes: &[TickerQuote]) {}

    /// Candidates of the current tick, sorted by compound rate, and the ranker's pick
    fn on_candidates<'a>(
        &mut self,
        _candidates: &'a [Triangle],
        _selection: Option<&'a Triangle>,
    ) {
    }

    fn on_trade_event(&mut self, event: &TradeEvent);
}

/// Forwards trade events to an async consumer, e.g. an execution task
pub struct ChannelObserver {
    tx: UnboundedSender<TradeEvent>,
    closed: bool,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<TradeEvent>) -> Self {
        Self { tx, closed: false }
    }
}

impl SessionObserver for ChannelObserver {
    fn on_trade_event(&mut self, event: &TradeEvent) {
        if self.closed {
            return;
        }
        if self.tx.send(event.clone()).is_err() {
            tracing::warn!("Trade event receiver dropped, no further events forwarded");
            self.closed = true;
        }
    }
}
