//! Configuration section types

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// Currency every triangle starts and ends in
    pub start_currency: String,
    /// Via-currencies tried as the first hop
    pub via_paths: Vec<String>,
    /// Currencies indexed as market groupings on every tick
    pub base_currencies: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Multiplicative factor a historical mean must exceed (e.g. 1.003)
    pub minimal_profit_rate: f64,
    /// History retention window in milliseconds
    pub retention_window_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Only signal, never place orders
    pub paper_only: bool,
    /// Queueing threshold in percent (3 -> 1.03). Unset disables the rate gate.
    pub min_queue_percentage_threshold: Option<f64>,
    /// Hits required before a queued triangle is re-validated
    pub min_hits_threshold: u32,
    /// Evict queue entries idle for longer than this. Unset keeps them for the session.
    pub queue_retention_ms: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// NDJSON file of raw all-market ticks to replay
    pub replay_path: Option<String>,
    /// Interval between replayed ticks in milliseconds
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Data directory
    pub data_dir: String,
    /// Record candidates and ready trades to CSV
    pub log_history: bool,
    /// Record every raw tick as NDJSON, replayable through `feed.replay_path`
    pub log_raw_ticks: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Candidates rendered per tick
    pub max_rows: usize,
    /// Share of the pre-fee profit consumed by fees when paying in BNB
    pub bnb_fee_share: f64,
    /// Share of the pre-fee profit consumed by standard fees
    pub normal_fee_share: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of the human format
    pub json: bool,
}
