//! Driver observer trait for progress reporting and test instrumentation.

use sg_core::Tick;
use sg_output::FlushReport;
use tracing::{debug, info, warn};

use crate::DriverSummary;

/// Callbacks invoked by [`Driver`][crate::Driver] at key points in the tick
/// loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait DriverObserver {
    /// Called at the start of each tick, before the engine advances.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick.  `sampled` is the number of
    /// measurements produced this tick.
    fn on_tick_end(&mut self, _tick: Tick, _sampled: usize) {}

    /// Called after every flush, including the final one on shutdown.
    fn on_flush(&mut self, _tick: Tick, _report: &FlushReport) {}

    /// Called once when the Driver reaches STOPPED.
    fn on_stop(&mut self, _summary: &DriverSummary) {}
}

/// A [`DriverObserver`] that does nothing.
pub struct NoopObserver;

impl DriverObserver for NoopObserver {}

/// Logs a progress line every `every` ticks, flags unclean flushes, and
/// reports the summary on stop.
pub struct LoggingObserver {
    every:         u64,
    flush_count:   u64,
    failure_count: u64,
}

impl LoggingObserver {
    /// `every == 0` disables the periodic progress line.
    pub fn new(every: u64) -> Self {
        Self { every, flush_count: 0, failure_count: 0 }
    }
}

impl DriverObserver for LoggingObserver {
    fn on_tick_end(&mut self, tick: Tick, sampled: usize) {
        if self.every > 0 && (tick.0 + 1) % self.every == 0 {
            info!(
                tick = tick.0 + 1,
                sampled,
                flushes = self.flush_count,
                failed_flushes = self.failure_count,
                "progress"
            );
        }
    }

    fn on_flush(&mut self, tick: Tick, report: &FlushReport) {
        self.flush_count += 1;
        if report.is_clean() {
            debug!(tick = tick.0, relational = report.relational.written(), "flush complete");
        } else {
            self.failure_count += 1;
            warn!(tick = tick.0, ?report, "flush incomplete");
        }
    }

    fn on_stop(&mut self, summary: &DriverSummary) {
        info!(
            ticks = summary.ticks,
            measurements = summary.measurements,
            flushes = summary.flushes,
            failed_flushes = summary.failed_flushes,
            "driver stopped"
        );
    }
}
