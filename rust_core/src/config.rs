//! Configuration for the game monitor

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

/// Polling cadence and game window, fixed for the lifetime of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    poll_interval: Duration,
    game_window: Duration,
}

impl MonitorConfig {
    /// `poll_interval` must be non-zero. A zero `game_window` disables
    /// window filtering.
    pub fn new(poll_interval: Duration, game_window: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(anyhow!("monitor poll interval must be > 0"));
        }

        Ok(Self {
            poll_interval,
            game_window,
        })
    }

    /// Load from `MONITOR_INTERVAL_SECS` (default 30) and `GAME_WINDOW_SECS`
    /// (default 0)
    pub fn from_env() -> Result<Self> {
        let poll_interval = parse_u64("MONITOR_INTERVAL_SECS", 30)?;
        let game_window = parse_u64("GAME_WINDOW_SECS", 0)?;

        Self::new(
            Duration::from_secs(poll_interval),
            Duration::from_secs(game_window),
        )
        .map_err(|e| anyhow!("MONITOR_INTERVAL_SECS: {}", e))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn game_window(&self) -> Duration {
        self.game_window
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}
