//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter.  In live mode the
//! timestamp stamped on a tick's measurements is the wall clock at the start
//! of that tick.  In backfill mode it comes from a `SimClock`:
//!
//!   timestamp = start + tick * tick_duration
//!
//! so a backfill of N ticks is reproducible and never sleeps.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Maps tick counts to UTC instants for simulated (non-wall-clock) runs.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Instant of tick 0.
    pub start: DateTime<Utc>,
    /// How many seconds one tick represents.  Default: 1.
    pub tick_duration_secs: u32,
    /// The current tick, advanced by [`SimClock::advance`].
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>, tick_duration_secs: u32) -> Self {
        Self {
            start,
            tick_duration_secs,
            current_tick: Tick::ZERO,
        }
    }

    /// Clock starting at the historic backfill origin, 2025-07-15T09:32:00Z,
    /// one second per tick.
    pub fn backfill_default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 7, 15, 9, 32, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(start, 1)
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> i64 {
        self.current_tick.0 as i64 * self.tick_duration_secs as i64
    }

    /// Instant corresponding to `current_tick`.
    pub fn now(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.elapsed_secs())
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_tick, format_utc(self.now()))
    }
}

/// ISO-8601 UTC with second precision and a trailing `Z`
/// (`2025-07-15T09:32:00Z`), the format every sink writes.
pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
