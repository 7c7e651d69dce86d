//! The `Driver` struct and its tick loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, SubsecRound, Utc};
use sg_core::{SensorGroup, SensorType, SimClock, SimRng, Tick};
use sg_engine::{SimulationEngine, sample_group};
use sg_output::{BatchBuffer, MeasurementSink};
use tracing::{error, info};

use crate::{DriverObserver, NoopObserver};

/// Longest single sleep while waiting out a tick interval; bounds how long a
/// stop request can go unnoticed.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Lifecycle of a Driver.  Transitions only move forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverState {
    Running,
    /// Final flush in progress; no further ticks.
    Stopping,
    Stopped,
}

/// Where measurement timestamps come from.
#[derive(Clone, Debug)]
pub enum TimeSource {
    /// `Utc::now()` at the start of each tick, truncated to whole seconds.
    WallClock,
    /// A simulated clock advanced once per tick (backfill).
    Simulated(SimClock),
}

impl TimeSource {
    fn now(&self) -> DateTime<Utc> {
        match self {
            TimeSource::WallClock => Utc::now().trunc_subsecs(0),
            TimeSource::Simulated(clock) => clock.now(),
        }
    }

    fn advance(&mut self) {
        if let TimeSource::Simulated(clock) = self {
            clock.advance();
        }
    }
}

/// Counters reported when a Driver stops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverSummary {
    pub sensor_type:    SensorType,
    pub ticks:          u64,
    pub measurements:   u64,
    /// Flushes that had something to write, including the final one.
    pub flushes:        u64,
    /// Flushes where at least one sink dropped rows.
    pub failed_flushes: u64,
}

impl DriverSummary {
    pub(crate) fn new(sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            ticks:          0,
            measurements:   0,
            flushes:        0,
            failed_flushes: 0,
        }
    }
}

/// One sensor type's closed simulation loop.
///
/// Owns its engine, RNG, buffer and both sinks exclusively; nothing here is
/// shared with other Drivers.  Create via
/// [`DriverBuilder`][crate::DriverBuilder].
///
/// Dropping a Driver that has not reached STOPPED performs the shutdown
/// sequence, so buffered measurements are flushed and sinks finished on
/// every exit path.
pub struct Driver<R: MeasurementSink, S: MeasurementSink> {
    pub(crate) sensor_type:   SensorType,
    pub(crate) group:         SensorGroup,
    pub(crate) engine:        SimulationEngine,
    pub(crate) rng:           SimRng,
    pub(crate) buffer:        BatchBuffer,
    pub(crate) relational:    R,
    pub(crate) search:        S,
    pub(crate) time:          TimeSource,
    pub(crate) tick_interval: Duration,
    pub(crate) max_ticks:     Option<u64>,
    pub(crate) state:         DriverState,
    pub(crate) tick:          Tick,
    pub(crate) summary:       DriverSummary,
}

impl<R: MeasurementSink, S: MeasurementSink> Driver<R, S> {
    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// The next tick to run.
    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    #[inline]
    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Measurements buffered since the last flush.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn summary(&self) -> &DriverSummary {
        &self.summary
    }

    pub fn relational(&self) -> &R {
        &self.relational
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Tick until `stop` is set (checked at the top of every tick) or the
    /// configured tick limit is reached, waiting one tick interval between
    /// ticks.  Then shut down and return the summary.
    pub fn run<O: DriverObserver>(&mut self, stop: &AtomicBool, observer: &mut O) -> DriverSummary {
        info!(
            sensor_type = %self.sensor_type,
            sensors = self.group.sensor_count(),
            scopes = self.group.scope_count(),
            flush_at = self.buffer.threshold(),
            "driver started"
        );
        while self.state == DriverState::Running && !stop.load(Ordering::Acquire) {
            if self.max_ticks.is_some_and(|n| self.summary.ticks >= n) {
                break;
            }
            let started = Instant::now();
            self.tick(observer);
            self.pause(started, stop);
        }
        self.shutdown(observer)
    }

    /// Run exactly `n` ticks without sleeping, ignoring the tick limit.
    /// Does not shut down.
    pub fn run_ticks<O: DriverObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.tick(observer);
        }
    }

    /// Advance the engine, sample every sensor, buffer, and flush if the
    /// threshold is reached.  Returns the number of measurements produced,
    /// or 0 once the Driver has left RUNNING.
    pub fn tick<O: DriverObserver>(&mut self, observer: &mut O) -> usize {
        if self.state != DriverState::Running {
            return 0;
        }
        let now = self.tick;
        observer.on_tick_start(now);

        let timestamp = self.time.now();
        self.engine.advance(&mut self.rng);
        let measurements = sample_group(&self.engine, &self.group, timestamp, &mut self.rng);
        let sampled = measurements.len();
        self.buffer.extend(measurements);
        self.summary.ticks += 1;
        self.summary.measurements += sampled as u64;

        if self.buffer.should_flush() {
            self.flush(now, observer);
        }

        observer.on_tick_end(now, sampled);
        self.tick = now + 1;
        self.time.advance();
        sampled
    }

    /// RUNNING → STOPPING → STOPPED: flush whatever is buffered, finish both
    /// sinks, and return the summary.  Calling it again is a no-op.
    pub fn shutdown<O: DriverObserver>(&mut self, observer: &mut O) -> DriverSummary {
        if self.state == DriverState::Stopped {
            return self.summary.clone();
        }
        self.state = DriverState::Stopping;
        if !self.buffer.is_empty() {
            let last = Tick(self.tick.0.saturating_sub(1));
            self.flush(last, observer);
        }
        for sink in [&mut self.relational as &mut dyn MeasurementSink, &mut self.search] {
            if let Err(e) = sink.finish() {
                error!(sensor_type = %self.sensor_type, sink = sink.label(), error = %e, "failed to close sink");
            }
        }
        self.state = DriverState::Stopped;
        observer.on_stop(&self.summary);
        self.summary.clone()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn flush<O: DriverObserver>(&mut self, tick: Tick, observer: &mut O) {
        let report = self.buffer.flush(&mut self.relational, &mut self.search);
        self.summary.flushes += 1;
        if !report.is_clean() {
            self.summary.failed_flushes += 1;
        }
        observer.on_flush(tick, &report);
    }

    /// Sleep out the rest of the tick interval, waking early on `stop`.
    fn pause(&self, started: Instant, stop: &AtomicBool) {
        let deadline = started + self.tick_interval;
        loop {
            let now = Instant::now();
            if now >= deadline || stop.load(Ordering::Acquire) {
                return;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }
}

impl<R: MeasurementSink, S: MeasurementSink> Drop for Driver<R, S> {
    fn drop(&mut self) {
        if self.state != DriverState::Stopped {
            self.shutdown(&mut NoopObserver);
        }
    }
}
