//! Game window cutoff computation.
//!
//! Games created before `now - window` are out of scope for a cycle. The
//! guard compares absolute epoch seconds against the window length in whole
//! seconds, and only then subtracts the full window from `now`. Note the two
//! sides of that guard are different kinds of quantity (a point in time and
//! a length); cutoffs near the epoch depend on it.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Compute the minimum creation timestamp (Unix seconds) for in-window games.
///
/// * zero window: 0, every game passes
/// * `now` at or before `window.as_secs()` seconds past the epoch: 0
/// * otherwise: `(now - window)` in Unix seconds
pub fn min_game_timestamp(now: DateTime<Utc>, window: Duration) -> u64 {
    if window.is_zero() {
        return 0;
    }

    let window_secs = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    if now.timestamp() <= window_secs {
        return 0;
    }

    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .map(|cutoff| cutoff.timestamp().max(0) as u64)
        .unwrap_or(0)
}
