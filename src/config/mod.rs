//! Configuration management for TriArb
//!
//! Loads from YAML/TOML files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ArbError;
use crate::ranker::RankParams;
use crate::trading::QueueParams;
use crate::types::Currency;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub arbitrage: ArbitrageConfig,
    pub ranking: RankingConfig,
    pub trading: TradingConfig,
    pub feed: FeedConfig,
    pub persistence: PersistenceConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TRIARB_*)
            .add_source(
                Environment::with_prefix("TRIARB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("arbitrage.via_paths")
                    .with_list_parse_key("arbitrage.base_currencies")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Built-in defaults only, no files or environment
    pub fn defaults() -> Result<Self> {
        Self::builder()?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = Config::builder()
            // Arbitrage defaults
            .set_default("arbitrage.start_currency", "USDT")?
            .set_default("arbitrage.via_paths", vec!["BTC"])?
            .set_default("arbitrage.base_currencies", vec!["BTC", "ETH", "BNB", "USDT"])?
            // Ranking defaults
            .set_default("ranking.minimal_profit_rate", 1.003)?
            .set_default("ranking.retention_window_ms", 60_000)?
            // Trading defaults
            .set_default("trading.paper_only", true)?
            .set_default("trading.min_queue_percentage_threshold", 3.0)?
            .set_default("trading.min_hits_threshold", 5)?
            // Feed defaults
            .set_default("feed.tick_interval_ms", 1000)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            .set_default("persistence.log_history", false)?
            .set_default("persistence.log_raw_ticks", false)?
            // Display defaults
            .set_default("display.max_rows", 10)?
            .set_default("display.bnb_fee_share", 0.05)?
            .set_default("display.normal_fee_share", 0.10)?
            // Logging defaults
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Reject settings the session cannot run with
    pub fn validate(&self) -> std::result::Result<(), ArbError> {
        let start = self.start_currency();
        if start.is_empty() {
            return Err(ArbError::Configuration(
                "arbitrage.start_currency is empty".to_string(),
            ));
        }
        if self.via_paths().is_empty() {
            return Err(ArbError::Configuration(
                "arbitrage.via_paths must name at least one currency".to_string(),
            ));
        }
        let bases = self.base_currencies();
        if !bases.contains(&start) {
            return Err(ArbError::Configuration(format!(
                "start currency {} is not among arbitrage.base_currencies",
                start
            )));
        }
        if let Some(missing) = self.via_paths().iter().find(|c| !bases.contains(c)) {
            return Err(ArbError::Configuration(format!(
                "via currency {} is not among arbitrage.base_currencies",
                missing
            )));
        }
        if self.ranking.retention_window_ms <= 0 {
            return Err(ArbError::Configuration(
                "ranking.retention_window_ms must be positive".to_string(),
            ));
        }
        if !self.ranking.minimal_profit_rate.is_finite() || self.ranking.minimal_profit_rate <= 0.0
        {
            return Err(ArbError::Configuration(
                "ranking.minimal_profit_rate must be a positive factor".to_string(),
            ));
        }
        Ok(())
    }

    pub fn start_currency(&self) -> Currency {
        Currency::new(&self.arbitrage.start_currency)
    }

    pub fn via_paths(&self) -> Vec<Currency> {
        self.arbitrage
            .via_paths
            .iter()
            .map(Currency::new)
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn base_currencies(&self) -> Vec<Currency> {
        self.arbitrage
            .base_currencies
            .iter()
            .map(Currency::new)
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn rank_params(&self) -> RankParams {
        RankParams {
            minimal_profit: self.ranking.minimal_profit_rate,
            retention_window_ms: self.ranking.retention_window_ms,
        }
    }

    pub fn queue_params(&self) -> QueueParams {
        QueueParams::from_percentage(
            self.trading.min_queue_percentage_threshold,
            self.trading.min_hits_threshold,
        )
        .with_retention(self.trading.queue_retention_ms)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "start={} via={:?} bases={:?} min_profit={:.4} window_ms={} queue_pct={:?} min_hits={} paper={}",
            self.arbitrage.start_currency,
            self.arbitrage.via_paths,
            self.arbitrage.base_currencies,
            self.ranking.minimal_profit_rate,
            self.ranking.retention_window_ms,
            self.trading.min_queue_percentage_threshold,
            self.trading.min_hits_threshold,
            self.trading.paper_only
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
