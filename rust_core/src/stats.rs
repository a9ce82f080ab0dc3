//! Cycle counters shared between a monitor and its loop task

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MonitorStats {
    pub cycles_started: AtomicU64,
    pub cycles_completed: AtomicU64,
    pub cycles_failed: AtomicU64,
    pub games_dispatched: AtomicU64,
    /// Detector or forecaster calls that panicked
    pub collaborator_panics: AtomicU64,
    /// Block number of the most recent cycle (0 before the first one)
    pub last_block_number: AtomicU64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_start(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block(&self, number: u64) {
        self.last_block_number.store(number, Ordering::Relaxed);
    }

    pub fn record_success(&self, games: usize) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.games_dispatched.fetch_add(games as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.collaborator_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            games_dispatched: self.games_dispatched.load(Ordering::Relaxed),
            collaborator_panics: self.collaborator_panics.load(Ordering::Relaxed),
            last_block_number: self.last_block_number.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStatsSnapshot {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub games_dispatched: u64,
    pub collaborator_panics: u64,
    pub last_block_number: u64,
}

impl MonitorStatsSnapshot {
    /// Cycles that have finished, successfully or not
    pub fn cycles_finished(&self) -> u64 {
        self.cycles_completed + self.cycles_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = MonitorStats::new();
        stats.record_start();
        stats.record_block(100);
        stats.record_success(2);
        stats.record_start();
        stats.record_failure();
        stats.record_panic();

        let snap = stats.snapshot();
        assert_eq!(snap.cycles_started, 2);
        assert_eq!(snap.cycles_completed, 1);
        assert_eq!(snap.cycles_failed, 1);
        assert_eq!(snap.cycles_finished(), 2);
        assert_eq!(snap.games_dispatched, 2);
        assert_eq!(snap.collaborator_panics, 1);
        assert_eq!(snap.last_block_number, 100);
    }
}
