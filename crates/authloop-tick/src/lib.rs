//! Periodic check timer for authloop.
//!
//! The auth worker re-validates its session with the remote authority on a
//! fixed interval (30 s by default). This is the only source of
//! unsolicited traffic, so the timer is deliberately simple: one tick per
//! interval, never a burst.
//!
//! # Disabled mode
//!
//! When the interval is zero, [`CheckTimer::wait_for_tick`] pends forever.
//! Tests and hosts that drive checks manually use this.
//!
//! # Integration
//!
//! The timer sits inside the worker's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = rx.recv() => { /* handle commands */ }
//!         _ = timer.wait_for_tick() => { /* dispatch a periodic check */ }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the check timer.
#[derive(Debug, Clone)]
pub struct CheckTimerConfig {
    /// Time between checks. Zero disables the timer.
    pub interval: Duration,
    /// Random extra delay (0..max) added to the *first* tick only, so
    /// contexts opened at the same instant don't probe in lockstep.
    pub initial_jitter: Duration,
}

impl Default for CheckTimerConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            initial_jitter: Duration::ZERO,
        }
    }
}

impl CheckTimerConfig {
    /// Default time between periodic checks.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
    /// Shortest interval accepted; anything below is raised to this.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

    /// Config for a specific interval with no jitter.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Fix out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`CheckTimer::new`]. A non-zero interval
    /// below [`Self::MIN_INTERVAL`] is raised to it; the jitter is capped
    /// at one interval.
    pub fn validated(mut self) -> Self {
        if !self.interval.is_zero() && self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                min_ms = Self::MIN_INTERVAL.as_millis() as u64,
                "check interval below minimum, raising"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        if self.initial_jitter > self.interval {
            self.initial_jitter = self.interval;
        }
        self
    }

    /// Returns `true` if the timer never fires.
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`CheckTimer::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct CheckTick {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How many whole intervals were missed because the worker was busy
    /// (0 in normal operation). Missed checks are never replayed.
    pub missed: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Fixed-interval timer driving the periodic auth check.
pub struct CheckTimer {
    interval: Option<Duration>,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: Option<Instant>,
}

impl CheckTimer {
    /// Create a new timer. The first tick fires one interval (plus jitter)
    /// from now.
    pub fn new(config: CheckTimerConfig) -> Self {
        let config = config.validated();
        let interval = (!config.is_disabled()).then_some(config.interval);

        let next_tick = interval.map(|d| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max = config.initial_jitter.as_micros() as u64;
                Duration::from_micros(rand::rng().random_range(0..max))
            };
            Instant::now() + d + jitter
        });

        match interval {
            None => debug!("check timer disabled"),
            Some(d) => debug!(interval_ms = d.as_millis() as u64, "check timer created"),
        }

        Self {
            interval,
            tick_count: 0,
            next_tick,
        }
    }

    /// Create a timer for a specific interval with no jitter.
    pub fn with_interval(interval: Duration) -> Self {
        Self::new(CheckTimerConfig::with_interval(interval))
    }

    /// Wait until the next check is due.
    ///
    /// When disabled, this future pends forever; `tokio::select!`
    /// keeps processing its other branches.
    pub async fn wait_for_tick(&mut self) -> CheckTick {
        let (next, interval) = match (self.next_tick, self.interval) {
            (Some(next), Some(interval)) => (next, interval),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // A late wake-up skips the missed intervals and schedules from now.
        let late_by = now.saturating_duration_since(next);
        let missed = (late_by.as_nanos() / interval.as_nanos()) as u64;
        if missed > 0 {
            warn!(tick = self.tick_count, missed, "check timer fell behind, skipping");
        }
        self.next_tick = Some(now + interval);

        trace!(tick = self.tick_count, "check tick fired");

        CheckTick {
            tick: self.tick_count,
            missed,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.interval.is_none()
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The check interval, or `None` when disabled.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}
