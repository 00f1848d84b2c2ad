//! Replay of recorded all-market ticks, one JSON payload per line

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::{binance, TickSource};
use crate::types::TickerQuote;

pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    pacing: Option<Interval>,
    line_no: usize,
}

impl ReplaySource {
    /// Open an NDJSON recording. A zero `tick_interval_ms` replays as fast as possible.
    pub async fn open(path: impl AsRef<Path>, tick_interval_ms: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;

        let pacing = (tick_interval_ms > 0).then(|| {
            let mut ticker = interval(Duration::from_millis(tick_interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        debug!(path = %path.display(), tick_interval_ms, "Replay source opened");
        Ok(Self {
            lines: BufReader::new(file).lines(),
            pacing,
            line_no: 0,
        })
    }
}

#[async_trait]
impl TickSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn next_tick(&mut self) -> Result<Option<Vec<TickerQuote>>> {
        loop {
            let next = self
                .lines
                .next_line()
                .await
                .context("Failed to read replay file")?;
            let Some(line) = next else {
                return Ok(None);
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match binance::decode_tick(&line) {
                Ok(quotes) => {
                    if let Some(pacing) = self.pacing.as_mut() {
                        pacing.tick().await;
                    }
                    return Ok(Some(quotes));
                }
                Err(e) => {
                    warn!(line = self.line_no, error = %e, "Skipping undecodable replay line");
                }
            }
        }
    }
}
