//! Log-only detector and forecaster
//!
//! Summarises each cycle's games so an operator can see the monitor is alive
//! and what it is looking at.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispute_mon_core::{Clock, Detector, Forecaster, GameMetadata};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct GameReporter {
    clock: Arc<dyn Clock>,
}

impl GameReporter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Detector for GameReporter {
    async fn detect(&self, _cancel: &CancellationToken, games: &[GameMetadata]) {
        let by_type = count_by_type(games);
        info!("Detected {} games by type: {:?}", games.len(), by_type);
    }
}

#[async_trait]
impl Forecaster for GameReporter {
    async fn forecast(&self, _cancel: &CancellationToken, games: &[GameMetadata]) {
        match age_span(self.clock.now(), games) {
            Some((newest, oldest)) => info!(
                "Forecasting {} games, ages {}s to {}s",
                games.len(),
                newest,
                oldest
            ),
            None => info!("No games to forecast"),
        }
    }
}

/// Number of games per game type
pub fn count_by_type(games: &[GameMetadata]) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for game in games {
        *counts.entry(game.game_type).or_insert(0) += 1;
    }
    counts
}

/// Age in seconds of the newest and oldest game. Games stamped in the future
/// count as age 0.
pub fn age_span(now: DateTime<Utc>, games: &[GameMetadata]) -> Option<(u64, u64)> {
    let now = now.timestamp().max(0) as u64;
    let ages = games.iter().map(|g| now.saturating_sub(g.timestamp));
    let newest = ages.clone().min()?;
    let oldest = ages.max()?;
    Some((newest, oldest))
}
