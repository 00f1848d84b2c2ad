//! Candidate display
//!
//! Fee adjustment here is display-only. Profit figures are shares of the
//! pre-fee percentage, not exchange fee schedules.

use crate::config::DisplayConfig;
use crate::engine::SessionObserver;
use crate::scanner::Triangle;
use crate::trading::TradeEvent;

/// Pre-fee profit percentage of a compound rate
pub fn rate_pct(compound_rate: f64) -> f64 {
    (compound_rate - 1.0) * 100.0
}

/// Returns (fee, net) in percent for a pre-fee percentage and fee share
pub fn fee_adjusted(rate_pct: f64, fee_share: f64) -> (f64, f64) {
    let fee = rate_pct * fee_share;
    (fee, rate_pct - fee)
}

/// One rendered candidate
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub triangle: String,
    pub rate_pct: f64,
    pub bnb_fee_pct: f64,
    pub bnb_net_pct: f64,
    pub fee_pct: f64,
    pub net_pct: f64,
}

impl DisplayRow {
    pub fn new(triangle: &Triangle, config: &DisplayConfig) -> Self {
        let pct = triangle.profit_pct();
        let (bnb_fee_pct, bnb_net_pct) = fee_adjusted(pct, config.bnb_fee_share);
        let (fee_pct, net_pct) = fee_adjusted(pct, config.normal_fee_share);
        Self {
            triangle: triangle.id.to_string(),
            rate_pct: pct,
            bnb_fee_pct,
            bnb_net_pct,
            fee_pct,
            net_pct,
        }
    }
}

/// Logs the top candidates of each tick and every trade event
pub struct LogDisplay {
    config: DisplayConfig,
}

impl LogDisplay {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    pub fn rows(&self, candidates: &[Triangle]) -> Vec<DisplayRow> {
        candidates
            .iter()
            .take(self.config.max_rows)
            .map(|t| DisplayRow::new(t, &self.config))
            .collect()
    }
}

impl SessionObserver for LogDisplay {
    fn on_candidates<'a>(
        &mut self,
        candidates: &'a [Triangle],
        selection: Option<&'a Triangle>,
    ) {
        for (rank, row) in self.rows(candidates).iter().enumerate() {
            tracing::debug!(
                rank = rank + 1,
                triangle = %row.triangle,
                rate_pct = format!("{:.4}", row.rate_pct),
                bnb_net_pct = format!("{:.4}", row.bnb_net_pct),
                net_pct = format!("{:.4}", row.net_pct),
                "Candidate"
            );
        }

        if let Some(best) = selection {
            let row = DisplayRow::new(best, &self.config);
            tracing::info!(
                triangle = %row.triangle,
                rate_pct = format!("{:.4}", row.rate_pct),
                bnb_fee_pct = format!("{:.4}", row.bnb_fee_pct),
                bnb_net_pct = format!("{:.4}", row.bnb_net_pct),
                fee_pct = format!("{:.4}", row.fee_pct),
                net_pct = format!("{:.4}", row.net_pct),
                "📈 Best candidate"
            );
        }
    }

    fn on_trade_event(&mut self, event: &TradeEvent) {
        match event {
            TradeEvent::QueueUpdated(queue) => {
                tracing::debug!(
                    queued = queue.len(),
                    top = queue.first().map(|c| c.id().to_string()),
                    top_hits = queue.first().map(|c| c.hits()),
                    "Queue"
                );
            }
            TradeEvent::NewTradeQueued {
                candidate,
                live_rate,
                elapsed_ms,
            } => {
                let pct = rate_pct(*live_rate);
                let (_, net) = fee_adjusted(pct, self.config.normal_fee_share);
                tracing::info!(
                    triangle = %candidate.id(),
                    hits = candidate.hits(),
                    rate_pct = format!("{:.4}", pct),
                    net_pct = format!("{:.4}", net),
                    elapsed_ms,
                    "🎯 Trade ready"
                );
            }
        }
    }
}
