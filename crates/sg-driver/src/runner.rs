//! `Runner` — one Driver thread per sensor type, one shared stop flag.
//!
//! Every Driver is fully built on the calling thread before any thread is
//! spawned, so a configuration error aborts the whole run before the first
//! tick.  After that the threads share nothing but the read-only registry
//! (consumed during build) and the `Arc<AtomicBool>` stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sg_core::{SensorRegistry, SensorType, SimClock};
use sg_output::{DEFAULT_FLUSH_FACTOR, MeasurementSink, OutputResult};
use tracing::{error, info, info_span};

use crate::{DriverBuilder, DriverError, DriverResult, DriverSummary, LoggingObserver};

/// Opens the sinks for one Driver.  Called once per sensor type, on the
/// thread that starts the run.
pub trait SinkFactory {
    fn relational(&self, sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>>;
    fn search(&self, sensor_type: SensorType) -> OutputResult<Box<dyn MeasurementSink>>;
}

/// Settings shared by every Driver of a run.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub seed:           Option<u64>,
    pub flush_factor:   usize,
    pub tick_interval:  Duration,
    /// When set, timestamps come from a simulated clock starting here.
    pub start:          Option<DateTime<Utc>>,
    pub max_ticks:      Option<u64>,
    /// Ticks between progress log lines; 0 disables them.
    pub progress_every: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            seed:           None,
            flush_factor:   DEFAULT_FLUSH_FACTOR,
            tick_interval:  Duration::from_secs(1),
            start:          None,
            max_ticks:      None,
            progress_every: 60,
        }
    }
}

/// Launches the Drivers.
pub struct Runner<'a> {
    registry:     &'a SensorRegistry,
    sensor_types: Vec<SensorType>,
    config:       RunnerConfig,
}

impl<'a> Runner<'a> {
    /// A runner for every sensor type that has sensors in `registry`.
    pub fn new(registry: &'a SensorRegistry, config: RunnerConfig) -> Self {
        Self {
            sensor_types: registry.sensor_types().collect(),
            registry,
            config,
        }
    }

    /// Restrict the run to `types`, in the given order.  Repeated types are
    /// started once.
    pub fn sensor_types(mut self, types: &[SensorType]) -> Self {
        self.sensor_types.clear();
        for &t in types {
            if !self.sensor_types.contains(&t) {
                self.sensor_types.push(t);
            }
        }
        self
    }

    /// Build every Driver, then spawn one thread per Driver named
    /// `<slug>-driver`.
    ///
    /// # Errors
    ///
    /// Any build or sink-opening error; no thread is started in that case.
    pub fn start(self, sinks: &dyn SinkFactory) -> DriverResult<RunnerHandle> {
        if self.sensor_types.is_empty() {
            return Err(DriverError::Config("no sensor types selected".into()));
        }

        let mut drivers = Vec::with_capacity(self.sensor_types.len());
        for &t in &self.sensor_types {
            let mut builder = DriverBuilder::new(t, self.registry)
                .maybe_seed(self.config.seed)
                .flush_factor(self.config.flush_factor)
                .tick_interval(self.config.tick_interval);
            if let Some(start) = self.config.start {
                builder = builder.clock(SimClock::new(start, 1));
            }
            if let Some(n) = self.config.max_ticks {
                builder = builder.max_ticks(n);
            }
            drivers.push(builder.build(sinks.relational(t)?, sinks.search(t)?)?);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(drivers.len());
        for mut driver in drivers {
            let t = driver.sensor_type();
            let thread_stop = Arc::clone(&stop);
            let progress = self.config.progress_every;
            let spawned = thread::Builder::new()
                .name(format!("{}-driver", t.slug()))
                .spawn(move || {
                    let span = info_span!("driver", sensor_type = %t);
                    let _enter = span.enter();
                    driver.run(&thread_stop, &mut LoggingObserver::new(progress))
                });
            match spawned {
                Ok(h) => handles.push((t, h)),
                Err(source) => {
                    // Stop the ones already running before reporting.
                    stop.store(true, Ordering::Release);
                    for (_, h) in handles {
                        let _ = h.join();
                    }
                    return Err(DriverError::Spawn { sensor_type: t, source });
                }
            }
        }
        info!(drivers = handles.len(), "all drivers started");
        Ok(RunnerHandle { stop, handles })
    }
}

/// Handle to a started run.
pub struct RunnerHandle {
    stop:    Arc<AtomicBool>,
    handles: Vec<(SensorType, JoinHandle<DriverSummary>)>,
}

impl RunnerHandle {
    /// Ask every Driver to stop at its next tick boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// `true` once every Driver thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handles.iter().all(|(_, h)| h.is_finished())
    }

    /// Wait for every Driver, in launch order.  A panicked Driver is
    /// reported as `Panicked` without affecting the others.
    pub fn join(self) -> Vec<DriverResult<DriverSummary>> {
        self.handles
            .into_iter()
            .map(|(t, h)| {
                h.join().map_err(|_| {
                    error!(sensor_type = %t, "driver thread panicked");
                    DriverError::Panicked(t)
                })
            })
            .collect()
    }
}
