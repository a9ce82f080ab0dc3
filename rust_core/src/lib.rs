//! Dispute Monitor Core - periodic polling of dispute game state.
//!
//! This crate provides:
//! - The game monitor loop with start/stop lifecycle and cancellation
//! - Game window cutoff computation
//! - Collaborator traits for chain reads, detection and forecasting
//! - JSON-RPC and dispute game factory adapters built on ethers
//! - A clock abstraction with a hand-driven test clock

pub mod clients;
pub mod clock;
pub mod config;
pub mod errors;
pub mod fetchers;
pub mod monitor;
pub mod stats;
mod types;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock, Ticker};
pub use config::MonitorConfig;
pub use errors::{Cancelled, LifecycleError, MonitorError};
pub use fetchers::{
    BlockHashFetcher, BlockNumberFetcher, Collaborators, Detector, Forecaster, GameListFetcher,
};
pub use monitor::{GameMonitor, LifecycleState};
pub use stats::{MonitorStats, MonitorStatsSnapshot};
pub use types::*;
pub use window::min_game_timestamp;
