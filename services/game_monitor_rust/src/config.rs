//! Configuration for game_monitor_rust

use anyhow::{anyhow, Result};
use dispute_mon_core::MonitorConfig;
use ethers::types::Address;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // Chain
    pub rpc_url: String,
    pub factory_address: Address,

    // Polling
    pub monitor: MonitorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let rpc_url = env::var("ETH_RPC_URL").map_err(|_| anyhow!("ETH_RPC_URL must be set"))?;
        let factory = env::var("GAME_FACTORY_ADDRESS")
            .map_err(|_| anyhow!("GAME_FACTORY_ADDRESS must be set"))?;

        Self::new(rpc_url, &factory, MonitorConfig::from_env()?)
    }

    pub fn new(rpc_url: String, factory: &str, monitor: MonitorConfig) -> Result<Self> {
        if rpc_url.trim().is_empty() {
            return Err(anyhow!("ETH_RPC_URL must not be empty"));
        }

        Ok(Self {
            rpc_url,
            factory_address: parse_address("GAME_FACTORY_ADDRESS", factory)?,
            monitor,
        })
    }
}

/// Parse a hex address, with or without the 0x prefix
fn parse_address(var_name: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be a valid address, got {:?}", var_name, value))
}
