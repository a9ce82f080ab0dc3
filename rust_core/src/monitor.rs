//! Periodic dispute game monitor
//!
//! On every tick the monitor runs one cycle:
//! 1. fetch the current block number
//! 2. resolve it to a block hash
//! 3. load the games visible at that hash, created inside the game window
//! 4. hand the games to the detector, then to the forecaster
//!
//! Cycles run one at a time on a single background task. A failed cycle is
//! logged and the loop waits for the next tick; nothing is retried.

use crate::clock::{Clock, Ticker};
use crate::config::MonitorConfig;
use crate::errors::{Cancelled, LifecycleError, MonitorError};
use crate::fetchers::Collaborators;
use crate::stats::{MonitorStats, MonitorStatsSnapshot};
use crate::types::GameMetadata;
use crate::window::min_game_timestamp;
use anyhow::Result;
use ethers::types::U256;
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument, Span};

/// Lifecycle of a `GameMonitor`. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, never started
    Idle,
    /// Background loop active
    Running,
    /// Terminated
    Stopped,
}

/// Drives the polling loop and owns its lifecycle.
///
/// `start_monitoring` and `stop_monitoring` take `&mut self`: a monitor has a
/// single owner, and concurrent lifecycle calls are ruled out by the borrow.
pub struct GameMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    cycle: Arc<MonitorCycle>,
    span: Span,
    /// Parent of the per-run token
    base: CancellationToken,
    /// Scopes the cancellable fetches. Installed on start, cleared on stop.
    cancel: Option<CancellationToken>,
    /// One-shot termination signal observed by the loop
    done: CancellationToken,
    handle: Option<JoinHandle<()>>,
    state: LifecycleState,
}

impl GameMonitor {
    /// Create an idle monitor.
    ///
    /// `base` is the parent of the token handed to cancellable fetches;
    /// cancelling it aborts in-flight fetches but does not stop the loop.
    /// The loop task runs inside `span`.
    pub fn new(
        base: CancellationToken,
        clock: Arc<dyn Clock>,
        config: MonitorConfig,
        collaborators: Collaborators,
        span: Span,
    ) -> Self {
        let cycle = Arc::new(MonitorCycle {
            clock: clock.clone(),
            game_window: config.game_window(),
            collaborators,
            stats: Arc::new(MonitorStats::new()),
        });

        Self {
            config,
            clock,
            cycle,
            span,
            base,
            cancel: None,
            done: CancellationToken::new(),
            handle: None,
            state: LifecycleState::Idle,
        }
    }

    /// Start the polling loop on a background task. Returns immediately.
    ///
    /// Calling this while running is a no-op. A stopped monitor cannot be
    /// restarted.
    pub fn start_monitoring(&mut self) -> Result<(), LifecycleError> {
        match self.state {
            LifecycleState::Stopped => return Err(LifecycleError::Stopped),
            LifecycleState::Running => {
                self.span
                    .in_scope(|| debug!("Game monitor already running, ignoring start"));
                return Ok(());
            }
            LifecycleState::Idle => {}
        }

        // Never overwrite an installed token
        let cancel = self
            .cancel
            .get_or_insert_with(|| self.base.child_token())
            .clone();

        let ticker = self.clock.ticker(self.config.poll_interval());
        let task = run_loop(self.cycle.clone(), ticker, cancel, self.done.clone());

        self.span.in_scope(|| {
            info!(
                "Starting game monitor (interval: {:?}, game window: {:?})",
                self.config.poll_interval(),
                self.config.game_window()
            )
        });
        self.handle = Some(tokio::spawn(task.instrument(self.span.clone())));
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Cancel in-flight fetches and signal the loop to exit.
    ///
    /// Does not wait for the loop; see `wait_stopped`. A block hash lookup
    /// already in progress is allowed to finish. Repeated calls are no-ops.
    pub fn stop_monitoring(&mut self) {
        if self.state == LifecycleState::Stopped {
            self.span
                .in_scope(|| debug!("Game monitor already stopped, ignoring stop"));
            return;
        }

        self.span.in_scope(|| info!("Stopping game monitor"));
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.done.cancel();
        self.state = LifecycleState::Stopped;
    }

    /// Wait for the loop task to exit after `stop_monitoring`.
    ///
    /// Returns immediately if the monitor was never started or is still
    /// running.
    pub async fn wait_stopped(&mut self) {
        if self.state != LifecycleState::Stopped {
            return;
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                self.span
                    .in_scope(|| error!("Game monitor task failed: {}", e));
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn stats(&self) -> MonitorStatsSnapshot {
        self.cycle.stats.snapshot()
    }
}

impl Drop for GameMonitor {
    fn drop(&mut self) {
        if self.state == LifecycleState::Running {
            self.stop_monitoring();
        }
    }
}

/// Everything one cycle needs, shared with the loop task
struct MonitorCycle {
    clock: Arc<dyn Clock>,
    game_window: Duration,
    collaborators: Collaborators,
    stats: Arc<MonitorStats>,
}

impl MonitorCycle {
    async fn run(&self, cancel: &CancellationToken) -> Result<usize, MonitorError> {
        self.stats.record_start();
        let result = self.monitor_games(cancel).await;
        match &result {
            Ok(games) => self.stats.record_success(*games),
            Err(_) => self.stats.record_failure(),
        }
        result
    }

    async fn monitor_games(&self, cancel: &CancellationToken) -> Result<usize, MonitorError> {
        let block_number = cancellable(cancel, self.collaborators.block_number.block_number())
            .await
            .map_err(MonitorError::BlockNumberFetch)?;
        debug!(block_number, "Fetched block number");
        self.stats.record_block(block_number);

        // Not scoped to `cancel`: once started, the lookup runs to completion
        let block_hash = self
            .collaborators
            .block_hash
            .block_hash(U256::from(block_number))
            .await
            .map_err(MonitorError::BlockHashFetch)?;

        let min_timestamp = min_game_timestamp(self.clock.now(), self.game_window);
        let games = cancellable(
            cancel,
            self.collaborators
                .games
                .games_at_or_after(block_hash, min_timestamp),
        )
        .await
        .map_err(MonitorError::GameListFetch)?;
        debug!(
            "Loaded {} games at block {} ({:?}), min timestamp {}",
            games.len(),
            block_number,
            block_hash,
            min_timestamp
        );

        self.dispatch(cancel, &games).await;
        Ok(games.len())
    }

    /// Detector first, then forecaster, both scoped to `cancel`. A panic in
    /// either is logged and does not affect the other call or the loop.
    async fn dispatch(&self, cancel: &CancellationToken, games: &[GameMetadata]) {
        let detected = AssertUnwindSafe(self.collaborators.detector.detect(cancel, games))
            .catch_unwind()
            .await;
        if let Err(panic) = detected {
            self.stats.record_panic();
            error!("Game detector panicked: {}", panic_message(&*panic));
        }

        let forecasted = AssertUnwindSafe(self.collaborators.forecaster.forecast(cancel, games))
            .catch_unwind()
            .await;
        if let Err(panic) = forecasted {
            self.stats.record_panic();
            error!("Game forecaster panicked: {}", panic_message(&*panic));
        }
    }
}

async fn run_loop(
    cycle: Arc<MonitorCycle>,
    mut ticker: Box<dyn Ticker>,
    cancel: CancellationToken,
    done: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            // Termination wins over a pending tick
            _ = done.cancelled() => {
                info!("Game monitor loop exiting");
                return;
            }
            _ = ticker.tick() => {
                match cycle.run(&cancel).await {
                    Ok(games) => debug!("Monitoring cycle dispatched {} games", games),
                    // Includes cycles cut short by a stop
                    Err(e) => error!("Failed to monitor games: {}", describe_failure(&e)),
                }
            }
        }
    }
}

/// Race `fut` against `cancel`; a cancelled token wins even if `fut` is ready
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(Cancelled.into()),
        res = fut => res,
    }
}

/// Stage and full cause chain of a failed cycle
fn describe_failure(e: &MonitorError) -> String {
    format!("{}: {:#}", e, e.cause())
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
