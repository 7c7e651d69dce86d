//! Fluent builder for constructing a [`Driver`].

use std::time::Duration;

use sg_core::{SensorParams, SensorRegistry, SensorType, SimClock, SimRng, Tick};
use sg_engine::SimulationEngine;
use sg_output::{BatchBuffer, DEFAULT_FLUSH_FACTOR, MeasurementSink};

use crate::driver::DriverSummary;
use crate::{Driver, DriverError, DriverResult, DriverState, TimeSource};

/// Fluent builder for [`Driver<R, S>`].
///
/// # Optional inputs (have defaults)
///
/// | Method              | Default                                  |
/// |---------------------|------------------------------------------|
/// | `.params(p)`        | `SensorParams::for_type(sensor_type)`    |
/// | `.seed(s)`          | OS entropy                               |
/// | `.flush_factor(n)`  | 5 ticks                                  |
/// | `.tick_interval(d)` | 1 second                                 |
/// | `.clock(c)`         | wall clock                               |
/// | `.max_ticks(n)`     | unlimited                                |
///
/// # Example
///
/// ```rust,ignore
/// let mut driver = DriverBuilder::new(SensorType::Temperature, &registry)
///     .seed(42)
///     .build(sqlite_sink, search_sink)?;
/// driver.run(&stop, &mut NoopObserver);
/// ```
pub struct DriverBuilder<'a> {
    sensor_type:   SensorType,
    registry:      &'a SensorRegistry,
    params:        Option<SensorParams>,
    seed:          Option<u64>,
    flush_factor:  usize,
    tick_interval: Duration,
    clock:         Option<SimClock>,
    max_ticks:     Option<u64>,
}

impl<'a> DriverBuilder<'a> {
    pub fn new(sensor_type: SensorType, registry: &'a SensorRegistry) -> Self {
        Self {
            sensor_type,
            registry,
            params:        None,
            seed:          None,
            flush_factor:  DEFAULT_FLUSH_FACTOR,
            tick_interval: Duration::from_secs(1),
            clock:         None,
            max_ticks:     None,
        }
    }

    /// Replace the built-in parameter set.  Must be for the same sensor type.
    pub fn params(mut self, params: SensorParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Global run seed; the Driver derives its own stream from it.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Flush once `sensor_count × factor` measurements are buffered.
    pub fn flush_factor(mut self, factor: usize) -> Self {
        self.flush_factor = factor;
        self
    }

    /// Wall-clock wait between ticks.  `Duration::ZERO` runs flat out.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Stamp measurements from a simulated clock instead of the wall clock.
    pub fn clock(mut self, clock: SimClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Stop [`Driver::run`] after `n` ticks.
    pub fn max_ticks(mut self, n: u64) -> Self {
        self.max_ticks = Some(n);
        self
    }

    /// Validate inputs, build the engine and buffer, and return a RUNNING
    /// Driver that owns `relational` and `search`.
    ///
    /// # Errors
    ///
    /// - `Config` if the parameter set is for another sensor type.
    /// - `Core` if the fleet is empty or the parameters are invalid.
    /// - `Output` if the flush factor is zero.
    pub fn build<R, S>(self, relational: R, search: S) -> DriverResult<Driver<R, S>>
    where
        R: MeasurementSink,
        S: MeasurementSink,
    {
        let params = self
            .params
            .unwrap_or_else(|| SensorParams::for_type(self.sensor_type));
        if params.sensor_type != self.sensor_type {
            return Err(DriverError::Config(format!(
                "{} driver was given {} parameters",
                self.sensor_type, params.sensor_type
            )));
        }

        let group = self.registry.group(self.sensor_type, params.scope)?;
        let buffer = BatchBuffer::new(self.sensor_type, group.sensor_count(), self.flush_factor)?;

        let mut rng = match self.seed {
            Some(seed) => SimRng::for_sensor_type(seed, self.sensor_type),
            None => SimRng::from_entropy(),
        };
        let engine = SimulationEngine::new(params, &group, &mut rng)?;

        Ok(Driver {
            sensor_type:   self.sensor_type,
            group,
            engine,
            rng,
            buffer,
            relational,
            search,
            time:          self.clock.map_or(TimeSource::WallClock, TimeSource::Simulated),
            tick_interval: self.tick_interval,
            max_ticks:     self.max_ticks,
            state:         DriverState::Running,
            tick:          Tick::ZERO,
            summary:       DriverSummary::new(self.sensor_type),
        })
    }
}
