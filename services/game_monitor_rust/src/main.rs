mod config;
mod reporting;

use crate::config::Config;
use crate::reporting::GameReporter;
use anyhow::{Context, Result};
use dispute_mon_core::clients::{FactoryGameFetcher, RpcBlockFetcher};
use dispute_mon_core::{Clock, Collaborators, GameMonitor, SystemClock};
use dotenv::dotenv;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting Dispute Game Monitor...");

    let config = Config::from_env()?;

    // Chain
    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .context("Failed to create JSON-RPC provider")?;
    let provider = Arc::new(provider);
    let blocks = Arc::new(RpcBlockFetcher::new(provider.clone()));
    let games = Arc::new(FactoryGameFetcher::new(config.factory_address, provider));
    info!(
        "Watching factory {:?} via {}",
        games.factory_address(),
        config.rpc_url
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reporter = Arc::new(GameReporter::new(clock.clone()));

    let collaborators = Collaborators::new(blocks.clone(), blocks, games, reporter.clone(), reporter);
    let mut monitor = GameMonitor::new(
        CancellationToken::new(),
        clock,
        config.monitor,
        collaborators,
        info_span!("game_monitor", factory = ?config.factory_address),
    );

    monitor.start_monitoring()?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    monitor.stop_monitoring();
    monitor.wait_stopped().await;

    let stats = monitor.stats();
    info!(
        "Game monitor stopped: {} cycles completed, {} failed, {} games dispatched",
        stats.cycles_completed, stats.cycles_failed, stats.games_dispatched
    );
    Ok(())
}
