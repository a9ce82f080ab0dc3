//! Time source for the monitor
//!
//! The monitor reads wall-clock time (for the game window) and waits on a
//! periodic ticker (for the polling cadence). Both come from a `Clock` so
//! that tests can drive them by hand with `ManualClock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Periodic tick source
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick
    async fn tick(&mut self);
}

/// Wall clock plus ticker factory
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Create a ticker firing every `period`, first one `period` from now
    fn ticker(&self, period: Duration) -> Box<dyn Ticker>;
}

/// Real time: chrono for "now", tokio intervals for ticks
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        Box::new(IntervalTicker::new(period))
    }
}

/// Ticker backed by `tokio::time::Interval`.
///
/// A cycle that overruns the period delays the following tick instead of
/// producing a burst of catch-up ticks.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Hand-driven clock for tests.
///
/// Time only moves on `advance`. Each ticker holds at most one pending tick;
/// ticks that come due while one is already pending are dropped, the same
/// way a wall-clock ticker treats a slow consumer.
#[derive(Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ManualState>>,
}

struct ManualState {
    now: DateTime<Utc>,
    /// Time advanced since creation
    elapsed: Duration,
    timers: Vec<ManualTimer>,
}

struct ManualTimer {
    period: Duration,
    next: Duration,
    tx: mpsc::Sender<()>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                elapsed: Duration::ZERO,
                timers: Vec::new(),
            })),
        }
    }

    /// Move time forward, firing every ticker that came due.
    ///
    /// Panics if `by` does not fit in a chrono duration.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock();
        state.now = state.now
            + chrono::Duration::from_std(by).expect("advance duration out of range");
        state.elapsed += by;

        let elapsed = state.elapsed;
        state.timers.retain(|t| !t.tx.is_closed());
        for timer in state.timers.iter_mut() {
            if timer.next > elapsed {
                continue;
            }
            // Full buffer means a tick is already pending
            let _ = timer.tx.try_send(());
            let behind = (elapsed - timer.next).as_nanos();
            let periods = behind / timer.period.as_nanos() + 1;
            timer.next += Duration::from_nanos((timer.period.as_nanos() * periods) as u64);
        }
    }

    /// Number of live tickers created from this clock
    pub fn ticker_count(&self) -> usize {
        let mut state = self.state.lock();
        state.timers.retain(|t| !t.tx.is_closed());
        state.timers.len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }

    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        let period = period.max(Duration::from_nanos(1));
        let (tx, rx) = mpsc::channel(1);
        let mut state = self.state.lock();
        let next = state.elapsed + period;
        state.timers.push(ManualTimer { period, next, tx });
        Box::new(ManualTicker { rx })
    }
}

struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            // Clock dropped: time never moves again
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_000, 0).unwrap()
    }

    async fn ticked(ticker: &mut Box<dyn Ticker>) -> bool {
        tokio::time::timeout(Duration::from_millis(50), ticker.tick())
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn test_manual_clock_now_moves_on_advance() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now().timestamp(), 1_000);

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now().timestamp(), 1_090);
    }

    #[tokio::test]
    async fn test_manual_ticker_fires_after_period() {
        let clock = ManualClock::new(start());
        let mut ticker = clock.ticker(Duration::from_secs(10));

        clock.advance(Duration::from_secs(9));
        assert!(!ticked(&mut ticker).await);

        clock.advance(Duration::from_secs(1));
        assert!(ticked(&mut ticker).await);
        assert!(!ticked(&mut ticker).await);
    }

    #[tokio::test]
    async fn test_manual_ticker_drops_ticks_for_slow_consumer() {
        let clock = ManualClock::new(start());
        let mut ticker = clock.ticker(Duration::from_secs(1));

        clock.advance(Duration::from_secs(1));
        clock.advance(Duration::from_secs(1));
        clock.advance(Duration::from_secs(5));

        assert!(ticked(&mut ticker).await);
        assert!(!ticked(&mut ticker).await);

        // Schedule stays aligned to the period
        clock.advance(Duration::from_secs(1));
        assert!(ticked(&mut ticker).await);
    }

    #[tokio::test]
    async fn test_dropped_ticker_is_forgotten() {
        let clock = ManualClock::new(start());
        let ticker = clock.ticker(Duration::from_secs(1));
        assert_eq!(clock.ticker_count(), 1);

        drop(ticker);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.ticker_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_first_tick_after_period() {
        let mut ticker = SystemClock.ticker(Duration::from_secs(5));
        let begin = Instant::now();

        ticker.tick().await;
        assert!(begin.elapsed() >= Duration::from_secs(5));
    }
}
