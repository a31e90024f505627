//! Fixed-cadence countdown for Typerace race clocks.
//!
//! A [`Countdown`] fires a fixed number of ticks at a fixed interval and
//! then goes quiet. Each tick reports how many are left, which is exactly
//! what the race timer broadcasts to players.
//!
//! # Integration
//!
//! The countdown is meant to be awaited in a loop (or a `tokio::select!`
//! branch) inside a spawned task:
//!
//! ```ignore
//! let mut countdown = Countdown::new(120, Duration::from_secs(1));
//! while !countdown.is_finished() {
//!     let info = countdown.wait_for_tick().await;
//!     notify(info.remaining);
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// Smallest interval accepted; anything shorter is clamped up to this.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Information about a tick, returned by [`Countdown::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Ticks left after this one. Reaches 0 on the final tick.
    pub remaining: u32,
    /// `true` if this tick woke up more than a full interval late.
    pub overrun: bool,
}

/// Counts down `total` ticks spaced `interval` apart.
///
/// The first tick fires one interval after construction. Deadlines are
/// scheduled from the previous deadline, not from wake-up time, so the
/// clock does not drift; if the task falls more than a whole interval
/// behind, the schedule restarts from now instead of bursting.
#[derive(Debug)]
pub struct Countdown {
    interval: Duration,
    total: u32,
    remaining: u32,
    tick_count: u64,
    next_tick: TokioInstant,
}

impl Countdown {
    /// Creates a countdown of `total` ticks, `interval` apart.
    pub fn new(total: u32, interval: Duration) -> Self {
        let interval = if interval < MIN_INTERVAL {
            warn!(?interval, "countdown interval too short, clamping");
            MIN_INTERVAL
        } else {
            interval
        };
        debug!(total, ?interval, "countdown created");
        Self {
            interval,
            total,
            remaining: total,
            tick_count: 0,
            next_tick: TokioInstant::now() + interval,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Once the countdown has finished this future pends forever, so it is
    /// safe to leave in a `select!` branch.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.remaining == 0 {
            std::future::pending::<()>().await;
        }

        let deadline = self.next_tick;
        time::sleep_until(deadline).await;

        let now = TokioInstant::now();
        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > self.interval;

        self.tick_count += 1;
        self.remaining -= 1;
        self.next_tick = if overrun {
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "countdown overrun, rescheduling from now"
            );
            now + self.interval
        } else {
            deadline + self.interval
        };

        trace!(tick = self.tick_count, remaining = self.remaining, "countdown tick");

        TickInfo {
            tick: self.tick_count,
            remaining: self.remaining,
            overrun,
        }
    }

    /// Ticks left to fire.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Total ticks this countdown was created with.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The spacing between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` once every tick has fired.
    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}
