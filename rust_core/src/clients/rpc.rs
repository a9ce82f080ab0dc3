//! Block number and block hash lookups over Ethereum JSON-RPC

use crate::fetchers::{BlockHashFetcher, BlockNumberFetcher};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{BlockId, BlockNumber, H256, U256, U64};
use std::sync::Arc;
use tracing::debug;

/// Chain head reader backed by any ethers middleware
pub struct RpcBlockFetcher<M> {
    provider: Arc<M>,
}

impl<M: Middleware> RpcBlockFetcher<M> {
    pub fn new(provider: Arc<M>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<M: Middleware + 'static> BlockNumberFetcher for RpcBlockFetcher<M> {
    async fn block_number(&self) -> Result<u64> {
        let number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| anyhow!("eth_blockNumber failed: {}", e))?;
        Ok(number.as_u64())
    }
}

#[async_trait]
impl<M: Middleware + 'static> BlockHashFetcher for RpcBlockFetcher<M> {
    async fn block_hash(&self, number: U256) -> Result<H256> {
        if number > U256::from(u64::MAX) {
            return Err(anyhow!("block number {} out of range", number));
        }

        let id = BlockId::Number(BlockNumber::Number(U64::from(number.low_u64())));
        let block = self
            .provider
            .get_block(id)
            .await
            .map_err(|e| anyhow!("eth_getBlockByNumber({}) failed: {}", number, e))?
            .ok_or_else(|| anyhow!("block {} not found", number))?;

        let hash = block
            .hash
            .ok_or_else(|| anyhow!("block {} has no hash (pending)", number))?;
        debug!("Resolved block {} to {:?}", number, hash);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::Provider;
    use ethers::types::Block;

    #[tokio::test]
    async fn test_block_number() {
        let (provider, mock) = Provider::mocked();
        mock.push(U64::from(100)).unwrap();

        let fetcher = RpcBlockFetcher::new(Arc::new(provider));
        assert_eq!(fetcher.block_number().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_block_hash() {
        let (provider, mock) = Provider::mocked();
        let block = Block::<H256> {
            hash: Some(H256::repeat_byte(0xaa)),
            number: Some(U64::from(100)),
            ..Default::default()
        };
        mock.push(block).unwrap();

        let fetcher = RpcBlockFetcher::new(Arc::new(provider));
        assert_eq!(
            fetcher.block_hash(U256::from(100)).await.unwrap(),
            H256::repeat_byte(0xaa)
        );
    }

    #[tokio::test]
    async fn test_missing_block_is_an_error() {
        let (provider, mock) = Provider::mocked();
        mock.push(Option::<Block<H256>>::None).unwrap();

        let fetcher = RpcBlockFetcher::new(Arc::new(provider));
        let err = fetcher.block_hash(U256::from(7)).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_rpc_error_propagates() {
        // No queued response
        let (provider, _mock) = Provider::mocked();
        let fetcher = RpcBlockFetcher::new(Arc::new(provider));
        assert!(fetcher.block_number().await.is_err());
    }

    #[tokio::test]
    async fn test_block_number_out_of_range() {
        let (provider, _mock) = Provider::mocked();
        let fetcher = RpcBlockFetcher::new(Arc::new(provider));
        let too_big = U256::from(u64::MAX) + U256::one();
        assert!(fetcher.block_hash(too_big).await.is_err());
    }
}
