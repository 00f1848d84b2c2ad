//! TriArb - triangular arbitrage detector
//!
//! Replays full-market ticker snapshots through the arbitrage session and logs
//! candidates and ready-to-trade signals.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use triarb::config::AppConfig;
use triarb::display::LogDisplay;
use triarb::engine::{ArbitrageSession, ChannelObserver};
use triarb::error::ArbError;
use triarb::feed::ReplaySource;
use triarb::persistence::{CsvHistoryRecorder, RawTickRecorder};
use triarb::trading::TradeEvent;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(config.logging.json);

    info!("🚀 TriArb starting");
    info!("Config: {}", config);
    config.validate()?;

    if !config.trading.paper_only {
        warn!("trading.paper_only is off but order placement is not available; signalling only");
    }

    let replay_path = config.feed.replay_path.clone().ok_or_else(|| {
        ArbError::Configuration(
            "no tick transport: set feed.replay_path (TRIARB_FEED__REPLAY_PATH)".to_string(),
        )
    })?;

    let mut session = ArbitrageSession::new(&config)?;
    session.add_observer(Box::new(LogDisplay::new(config.display.clone())));

    if config.persistence.log_raw_ticks {
        let recorder = RawTickRecorder::new(&config.persistence.data_dir)?;
        session.add_observer(Box::new(recorder));
    }

    if config.persistence.log_history {
        let recorder = CsvHistoryRecorder::new(
            &config.persistence.data_dir,
            session.session_id().to_string(),
        )?;
        session.add_observer(Box::new(recorder));
    }

    // Execution hook: ready signals are forwarded here.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    session.add_observer(Box::new(ChannelObserver::new(event_tx)));
    let signals = tokio::spawn(async move {
        let mut ready = 0u64;
        while let Some(event) = event_rx.recv().await {
            if let TradeEvent::NewTradeQueued { candidate, .. } = event {
                ready += 1;
                info!(triangle = %candidate.id(), "Paper signal (no order placed)");
            }
        }
        ready
    });

    let mut source = ReplaySource::open(&replay_path, config.feed.tick_interval_ms)
        .await
        .context("Failed to open tick source")?;

    let stats = tokio::select! {
        result = session.run(&mut source) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            session.stats()
        }
    };

    // Dropping the session closes the event channel.
    drop(session);
    let ready = signals.await.context("Signal task failed")?;

    info!(
        ticks = stats.ticks,
        candidates = stats.candidates,
        selections = stats.selections,
        ready_signals = ready,
        "👋 TriArb stopped"
    );
    Ok(())
}
