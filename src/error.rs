//! Error types for the arbitrage core

use thiserror::Error;

use crate::types::Currency;

pub type Result<T> = std::result::Result<T, ArbError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArbError {
    /// Neither `to+from` nor `from+to` is quoted in the snapshot
    #[error("no market for {from} -> {to}")]
    NoMarketForPair { from: Currency, to: Currency },

    /// The resolved rate is NaN, infinite or not positive
    #[error("invalid rate {rate} on {symbol}")]
    InvalidRate { symbol: String, rate: f64 },

    /// Startup wiring or thresholds are unusable
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ArbError {
    /// Resolution failures are expected on a sparse currency graph and are absorbed locally
    pub fn is_unresolvable(&self) -> bool {
        matches!(
            self,
            ArbError::NoMarketForPair { .. } | ArbError::InvalidRate { .. }
        )
    }
}
