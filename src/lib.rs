//! TriArb Library
//!
//! Triangular arbitrage detection over full-market ticker snapshots

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod feed;
pub mod market;
pub mod persistence;
pub mod ranker;
pub mod scanner;
pub mod trading;
pub mod types;
