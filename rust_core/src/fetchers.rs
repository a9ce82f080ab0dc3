//! Collaborator seams consumed by the game monitor
//!
//! Chain reads (block number, block hash, game list) and the two game
//! consumers (detection, forecasting) are injected behind these traits so
//! the monitor can run against a live node or against test doubles.

use crate::types::GameMetadata;
use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{H256, U256};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Source of the current chain head
#[async_trait]
pub trait BlockNumberFetcher: Send + Sync {
    async fn block_number(&self) -> Result<u64>;
}

/// Resolves a block number to its hash
#[async_trait]
pub trait BlockHashFetcher: Send + Sync {
    async fn block_hash(&self, number: U256) -> Result<H256>;
}

/// Loads the games visible at a block
#[async_trait]
pub trait GameListFetcher: Send + Sync {
    /// Get all games as of `block_hash` created at or after `min_timestamp`
    /// (Unix seconds). A `min_timestamp` of 0 returns every game.
    async fn games_at_or_after(
        &self,
        block_hash: H256,
        min_timestamp: u64,
    ) -> Result<Vec<GameMetadata>>;
}

/// Consumes the games of each cycle to detect disputed outcomes.
///
/// Fire and forget: implementations handle and log their own failures.
/// `cancel` fires when the monitor is stopped; long-running work should
/// return early once it does.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, cancel: &CancellationToken, games: &[GameMetadata]);
}

/// Consumes the games of each cycle to forecast their resolution.
///
/// Same contract as `Detector`.
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn forecast(&self, cancel: &CancellationToken, games: &[GameMetadata]);
}

/// Everything a monitor needs to run one cycle
#[derive(Clone)]
pub struct Collaborators {
    pub block_number: Arc<dyn BlockNumberFetcher>,
    pub block_hash: Arc<dyn BlockHashFetcher>,
    pub games: Arc<dyn GameListFetcher>,
    pub detector: Arc<dyn Detector>,
    pub forecaster: Arc<dyn Forecaster>,
}

impl Collaborators {
    pub fn new(
        block_number: Arc<dyn BlockNumberFetcher>,
        block_hash: Arc<dyn BlockHashFetcher>,
        games: Arc<dyn GameListFetcher>,
        detector: Arc<dyn Detector>,
        forecaster: Arc<dyn Forecaster>,
    ) -> Self {
        Self {
            block_number,
            block_hash,
            games,
            detector,
            forecaster,
        }
    }
}
