//! Time helpers. Combat timestamps are monotonic wall-clock seconds (the
//! spec's `start_time`/`last_damage_time`), so these are plain
//! `SystemTime`-derived `f64` seconds rather than `Instant` — the Aggregator
//! needs to compute `now - start_time` against a fixed epoch, and snapshots
//! cross thread boundaries as plain data.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds elapsed since the Unix epoch, as a float so sub-second precision
/// survives into duration/running-time calculations.
#[inline]
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs_f64()
}

/// Small positive epsilon added to `running_time` so consumers dividing by
/// it (e.g. to compute DPS) never divide by zero on the very first tick.
pub const RUNNING_TIME_EPSILON: f64 = 1e-5;
