//! CSV Persistence Module
//!
//! Appends per-tick candidates and ready trades for offline analysis, and raw
//! ticks as NDJSON for later replay

use anyhow::{Context, Result};
use chrono::Utc;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::engine::SessionObserver;
use crate::feed::binance;
use crate::market::DirectedLeg;
use crate::scanner::Triangle;
use crate::trading::TradeEvent;
use crate::types::TickerQuote;

/// Flattened candidate row, one per triangle per tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub session_id: String,
    pub observed_at: i64,
    pub event_time: i64,
    pub triangle: String,
    pub compound_rate: f64,
    pub selected: bool,
    pub a_symbol: String,
    pub a_side: String,
    pub a_rate: f64,
    pub a_bid: f64,
    pub a_ask: f64,
    pub a_volume: f64,
    pub b_symbol: String,
    pub b_side: String,
    pub b_rate: f64,
    pub b_bid: f64,
    pub b_ask: f64,
    pub b_volume: f64,
    pub c_symbol: String,
    pub c_side: String,
    pub c_rate: f64,
    pub c_bid: f64,
    pub c_ask: f64,
    pub c_volume: f64,
}

impl CandidateRecord {
    pub fn new(session_id: &str, triangle: &Triangle, selected: bool) -> Self {
        let leg = |l: &DirectedLeg| {
            (
                l.symbol.clone(),
                l.side.to_string(),
                l.rate,
                l.bid_price,
                l.ask_price,
                l.volume,
            )
        };
        let [a, b, c] = triangle.legs().map(leg);
        let (a_symbol, a_side, a_rate, a_bid, a_ask, a_volume) = a;
        let (b_symbol, b_side, b_rate, b_bid, b_ask, b_volume) = b;
        let (c_symbol, c_side, c_rate, c_bid, c_ask, c_volume) = c;

        Self {
            session_id: session_id.to_string(),
            observed_at: triangle.observed_at,
            event_time: triangle.event_time,
            triangle: triangle.id.to_string(),
            compound_rate: triangle.compound_rate,
            selected,
            a_symbol,
            a_side,
            a_rate,
            a_bid,
            a_ask,
            a_volume,
            b_symbol,
            b_side,
            b_rate,
            b_bid,
            b_ask,
            b_volume,
            c_symbol,
            c_side,
            c_rate,
            c_bid,
            c_ask,
            c_volume,
        }
    }
}

/// Ready-to-trade signal row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTradeRecord {
    pub session_id: String,
    pub timestamp: i64,
    pub triangle: String,
    pub hits: u32,
    pub mean_rate: f64,
    pub live_rate: f64,
    pub first_seen_at: i64,
    pub elapsed_ms: i64,
}

/// CSV history recorder
pub struct CsvHistoryRecorder {
    data_dir: PathBuf,
    session_id: String,
    candidate_writer: csv::Writer<std::fs::File>,
    trade_writer: csv::Writer<std::fs::File>,
}

impl CsvHistoryRecorder {
    pub fn new(data_dir: &str, session_id: impl Into<String>) -> Result<Self> {
        let data_dir = PathBuf::from(data_dir);

        // Create directory if it doesn't exist
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let today = Utc::now().format("%Y-%m-%d");
        let candidate_writer =
            Self::create_writer(&data_dir, &format!("arbitrage_ticks_{}.csv", today))?;
        let trade_writer =
            Self::create_writer(&data_dir, &format!("queued_trades_{}.csv", today))?;

        info!("📁 CSV history initialized at {:?}", data_dir);

        Ok(Self {
            data_dir,
            session_id: session_id.into(),
            candidate_writer,
            trade_writer,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn create_writer(dir: &Path, filename: &str) -> Result<csv::Writer<std::fs::File>> {
        let path = dir.join(filename);
        let file_has_data =
            path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open CSV file")?;

        let writer = WriterBuilder::new()
            .has_headers(!file_has_data)
            .from_writer(file);

        Ok(writer)
    }

    /// Append all candidates of one tick
    pub fn save_candidates(
        &mut self,
        candidates: &[Triangle],
        selection: Option<&Triangle>,
    ) -> Result<()> {
        for triangle in candidates {
            let selected = selection.map(|s| s.id == triangle.id).unwrap_or(false);
            self.candidate_writer
                .serialize(CandidateRecord::new(&self.session_id, triangle, selected))
                .context("Failed to write candidate record")?;
        }
        self.candidate_writer
            .flush()
            .context("Failed to flush candidate writer")?;
        Ok(())
    }

    pub fn save_trade(&mut self, record: QueuedTradeRecord) -> Result<()> {
        self.trade_writer
            .serialize(&record)
            .context("Failed to write queued trade record")?;
        self.trade_writer
            .flush()
            .context("Failed to flush trade writer")?;
        Ok(())
    }
}

impl SessionObserver for CsvHistoryRecorder {
    fn on_candidates<'a>(
        &mut self,
        candidates: &'a [Triangle],
        selection: Option<&'a Triangle>,
    ) {
        if candidates.is_empty() {
            return;
        }
        if let Err(e) = self.save_candidates(candidates, selection) {
            warn!("Failed to record candidates: {:#}", e);
        }
    }

    fn on_trade_event(&mut self, event: &TradeEvent) {
        if let TradeEvent::NewTradeQueued {
            candidate,
            live_rate,
            elapsed_ms,
        } = event
        {
            let record = QueuedTradeRecord {
                session_id: self.session_id.clone(),
                timestamp: candidate.last_hit_at(),
                triangle: candidate.id().to_string(),
                hits: candidate.hits(),
                mean_rate: candidate.mean_rate(),
                live_rate: *live_rate,
                first_seen_at: candidate.first_seen_at(),
                elapsed_ms: *elapsed_ms,
            };
            if let Err(e) = self.save_trade(record) {
                warn!("Failed to record queued trade: {:#}", e);
            }
        }
    }
}

/// Raw tick recorder, one ticker array per line in the form `ReplaySource` reads
pub struct RawTickRecorder {
    path: PathBuf,
    writer: BufWriter<std::fs::File>,
}

impl RawTickRecorder {
    pub fn new(data_dir: &str) -> Result<Self> {
        let data_dir = PathBuf::from(data_dir);
        fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

        let today = Utc::now().format("%Y-%m-%d");
        let path = data_dir.join(format!("raw_ticks_{}.ndjson", today));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open raw tick file")?;

        info!("📁 Raw tick recording to {:?}", path);

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save_tick(&mut self, quotes: &[TickerQuote]) -> Result<()> {
        let line = binance::encode_tick(quotes)?;
        writeln!(self.writer, "{}", line).context("Failed to write raw tick")?;
        self.writer.flush().context("Failed to flush raw tick writer")?;
        Ok(())
    }
}

impl SessionObserver for RawTickRecorder {
    fn on_tick(&mut self, quotes: &[TickerQuote]) {
        if let Err(e) = self.save_tick(quotes) {
            warn!("Failed to record raw tick: {:#}", e);
        }
    }

    fn on_trade_event(&mut self, _event: &TradeEvent) {}
}
