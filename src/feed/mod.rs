//! Tick feeds - where full-market snapshots come from
//!
//! Exchange connectivity lives outside this crate. A transport hands whole ticks
//! to the session through [`TickSource`]; [`ChannelSource`] adapts a tokio channel
//! and [`ReplaySource`] replays recorded all-market ticker payloads.

pub mod binance;
mod replay;

pub use replay::ReplaySource;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

use crate::types::TickerQuote;

/// Trait for anything that yields full-market ticks in arrival order
#[async_trait]
pub trait TickSource: Send {
    /// Get the source name
    fn name(&self) -> &str;

    /// Next tick, or `None` once the stream has ended
    async fn next_tick(&mut self) -> Result<Option<Vec<TickerQuote>>>;
}

/// Ticks pushed by an external transport over a channel
pub struct ChannelSource {
    name: String,
    rx: Receiver<Vec<TickerQuote>>,
}

impl ChannelSource {
    pub fn new(name: impl Into<String>, rx: Receiver<Vec<TickerQuote>>) -> Self {
        Self {
            name: name.into(),
            rx,
        }
    }
}

#[async_trait]
impl TickSource for ChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_tick(&mut self) -> Result<Option<Vec<TickerQuote>>> {
        Ok(self.rx.recv().await)
    }
}
