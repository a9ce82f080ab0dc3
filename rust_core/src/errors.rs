//! Error types for the game monitor.

use thiserror::Error;

/// A monitoring cycle failed. Always cycle-local: logged by the loop, which
/// then waits for the next tick.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to fetch block number")]
    BlockNumberFetch(#[source] anyhow::Error),

    #[error("failed to fetch block hash")]
    BlockHashFetch(#[source] anyhow::Error),

    #[error("failed to load games")]
    GameListFetch(#[source] anyhow::Error),
}

/// Attached as the cause when a fetch was abandoned because the monitor
/// was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("game monitor cancelled")]
pub struct Cancelled;

/// Misuse of the monitor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("game monitor has been stopped and cannot be restarted")]
    Stopped,
}

impl MonitorError {
    /// Underlying cause of the failure
    pub fn cause(&self) -> &anyhow::Error {
        match self {
            MonitorError::BlockNumberFetch(e)
            | MonitorError::BlockHashFetch(e)
            | MonitorError::GameListFetch(e) => e,
        }
    }

    /// True when the cycle was cut short by a stop request
    pub fn is_cancelled(&self) -> bool {
        self.cause().downcast_ref::<Cancelled>().is_some()
    }
}
