//! Dispute game factory reader
//!
//! Lists the games the factory has created, pinned to a specific block hash
//! so that every read in a cycle sees the same chain state.

use crate::fetchers::GameListFetcher;
use crate::types::GameMetadata;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::providers::Middleware;
use ethers::types::{Address, BlockId, H256, U256};
use std::sync::Arc;
use tracing::debug;

abigen!(
    DisputeGameFactory,
    r#"[
        function gameCount() external view returns (uint256)
        function gameAtIndex(uint256 index) external view returns (uint32, uint64, address)
    ]"#
);

/// `GameListFetcher` over the factory's `gameCount` / `gameAtIndex` views
pub struct FactoryGameFetcher<M> {
    contract: DisputeGameFactory<M>,
}

impl<M: Middleware> FactoryGameFetcher<M> {
    pub fn new(factory: Address, provider: Arc<M>) -> Self {
        Self {
            contract: DisputeGameFactory::new(factory, provider),
        }
    }

    pub fn factory_address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M: Middleware + 'static> GameListFetcher for FactoryGameFetcher<M> {
    /// Walks from the newest game backwards and stops at the first game
    /// created before `min_timestamp`. Games come back newest first.
    async fn games_at_or_after(
        &self,
        block_hash: H256,
        min_timestamp: u64,
    ) -> Result<Vec<GameMetadata>> {
        let block = BlockId::Hash(block_hash);
        let count = self
            .contract
            .game_count()
            .block(block)
            .call()
            .await
            .map_err(|e| anyhow!("gameCount at {:?} failed: {}", block_hash, e))?;

        let mut games = Vec::new();
        let mut index = count;
        while !index.is_zero() {
            index -= U256::one();
            let (game_type, timestamp, proxy) = self
                .contract
                .game_at_index(index)
                .block(block)
                .call()
                .await
                .map_err(|e| anyhow!("gameAtIndex({}) at {:?} failed: {}", index, block_hash, e))?;

            if timestamp < min_timestamp {
                break;
            }
            games.push(GameMetadata::new(index.low_u64(), game_type, timestamp, proxy));
        }

        debug!(
            "Factory {:?} has {} games, {} at or after {}",
            self.contract.address(),
            count,
            games.len(),
            min_timestamp
        );
        Ok(games)
    }
}
