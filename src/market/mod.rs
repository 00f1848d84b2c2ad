//! Market module - per-tick snapshot indexing and leg resolution
//!
//! Turns one raw all-market tick into a [`MarketSnapshot`] and resolves
//! directional conversion legs against it.

mod resolver;
mod snapshot;

pub use resolver::{resolve, resolve_cycle, DirectedLeg};
pub use snapshot::{MarketSnapshot, StreamIndexer, DEFAULT_BASE_CURRENCIES};
