//! Integration tests for sg-driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sg_core::{Measurement, SensorRegistry, SensorType, SimClock, Tick};
use sg_output::{FlushReport, MeasurementSink, OutputError, OutputResult, WriteReport};

use crate::{Driver, DriverBuilder, DriverObserver, DriverState, DriverSummary, NoopObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Shared log of what a sink received, readable after the Driver is gone.
#[derive(Clone, Default)]
struct Log {
    batches: Arc<Mutex<Vec<Vec<Measurement>>>>,
    threads: Arc<Mutex<Vec<String>>>,
}

impl Log {
    fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn all(&self) -> Vec<Measurement> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

struct Recorder {
    label: &'static str,
    fail:  bool,
    log:   Log,
}

impl Recorder {
    fn ok(label: &'static str, log: &Log) -> Self {
        Self { label, fail: false, log: log.clone() }
    }

    fn failing(label: &'static str, log: &Log) -> Self {
        Self { label, fail: true, log: log.clone() }
    }
}

impl MeasurementSink for Recorder {
    fn label(&self) -> &'static str {
        self.label
    }

    fn write_batch(&mut self, batch: &[Measurement]) -> OutputResult<WriteReport> {
        self.log.batches.lock().unwrap().push(batch.to_vec());
        let name = std::thread::current().name().unwrap_or("?").to_owned();
        self.log.threads.lock().unwrap().push(name);
        if self.fail {
            return Err(OutputError::Config("relational store unavailable".into()));
        }
        Ok(WriteReport::all(batch.len()))
    }
}

/// Two temperature sensors sharing zone `a01`.
fn two_sensor_registry() -> SensorRegistry {
    SensorRegistry::from_entries([
        (SensorType::Temperature, "temp-001", "a01"),
        (SensorType::Temperature, "temp-002", "a01"),
    ])
    .unwrap()
}

fn temperature_driver(
    registry: &SensorRegistry,
    sql: &Log,
    search: &Log,
) -> Driver<Recorder, Recorder> {
    DriverBuilder::new(SensorType::Temperature, registry)
        .seed(42)
        .tick_interval(Duration::ZERO)
        .build(Recorder::ok("relational", sql), Recorder::ok("search", search))
        .unwrap()
}

#[derive(Default)]
struct Counting {
    flush_ticks: Vec<u64>,
    ticks_ended: u64,
    stopped:     Option<DriverSummary>,
}

impl DriverObserver for Counting {
    fn on_tick_end(&mut self, _tick: Tick, _sampled: usize) {
        self.ticks_ended += 1;
    }

    fn on_flush(&mut self, tick: Tick, _report: &FlushReport) {
        self.flush_ticks.push(tick.0);
    }

    fn on_stop(&mut self, summary: &DriverSummary) {
        self.stopped = Some(summary.clone());
    }
}

// ── DriverBuilder validation ──────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use sg_core::SensorParams;

    use super::*;

    #[test]
    fn zero_flush_factor_rejected() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let r = DriverBuilder::new(SensorType::Temperature, &reg)
            .flush_factor(0)
            .build(Recorder::ok("relational", &log), Recorder::ok("search", &log));
        assert!(r.is_err());
    }

    #[test]
    fn empty_fleet_rejected() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let r = DriverBuilder::new(SensorType::Humidity, &reg)
            .build(Recorder::ok("relational", &log), Recorder::ok("search", &log));
        assert!(matches!(r, Err(crate::DriverError::Core(sg_core::CoreError::EmptyFleet(_)))));
    }

    #[test]
    fn foreign_params_rejected() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let r = DriverBuilder::new(SensorType::Temperature, &reg)
            .params(SensorParams::humidity())
            .build(Recorder::ok("relational", &log), Recorder::ok("search", &log));
        assert!(matches!(r, Err(crate::DriverError::Config(_))));
    }

    #[test]
    fn invalid_params_rejected() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let mut params = SensorParams::temperature();
        params.hold_duration = 0;
        let r = DriverBuilder::new(SensorType::Temperature, &reg)
            .params(params)
            .build(Recorder::ok("relational", &log), Recorder::ok("search", &log));
        assert!(r.is_err());
    }

    #[test]
    fn built_driver_is_running() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let d = temperature_driver(&reg, &log, &log);
        assert_eq!(d.state(), DriverState::Running);
        assert_eq!(d.current_tick(), Tick::ZERO);
        assert_eq!(d.engine().store().len(), 1, "one zone, one shared state");
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick_tests {
    use super::*;

    #[test]
    fn ten_ticks_two_sensors_two_flushes() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        let mut d = temperature_driver(&reg, &sql, &search);
        let mut obs = Counting::default();

        d.run_ticks(10, &mut obs);

        // Zero-based: flushes after the 5th and the 10th tick.
        assert_eq!(obs.flush_ticks, [4, 9]);
        assert_eq!(obs.ticks_ended, 10);
        assert_eq!(d.pending(), 0);
        assert_eq!(sql.batch_sizes(), [10, 10]);
        assert_eq!(search.batch_sizes(), [10, 10]);

        let all = sql.all();
        assert_eq!(all.len(), 20);
        for m in &all {
            let v = m.reading.primary();
            assert!((17.0..=25.0).contains(&v), "{v} out of band");
        }

        // Nothing buffered, so shutdown adds no flush.
        let summary = d.shutdown(&mut obs);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.measurements, 20);
        assert_eq!(summary.flushes, 2);
        assert_eq!(summary.failed_flushes, 0);
        assert_eq!(obs.flush_ticks.len(), 2);
        assert_eq!(d.state(), DriverState::Stopped);
    }

    #[test]
    fn measurements_in_tick_order() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        let mut d = DriverBuilder::new(SensorType::Temperature, &reg)
            .seed(1)
            .clock(SimClock::backfill_default())
            .build(Recorder::ok("relational", &sql), Recorder::ok("search", &search))
            .unwrap();
        d.run_ticks(5, &mut NoopObserver);

        let all = sql.all();
        let stamps: Vec<String> = all.iter().map(|m| sg_core::format_utc(m.timestamp)).collect();
        assert_eq!(stamps[0], "2025-07-15T09:32:00Z");
        assert_eq!(stamps[1], "2025-07-15T09:32:00Z");
        assert_eq!(stamps[2], "2025-07-15T09:32:01Z");
        assert_eq!(stamps[9], "2025-07-15T09:32:04Z");
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn same_seed_same_series() {
        let reg = two_sensor_registry();
        let run = || {
            let (sql, search) = (Log::default(), Log::default());
            let mut d = DriverBuilder::new(SensorType::Temperature, &reg)
                .seed(7)
                .clock(SimClock::backfill_default())
                .build(Recorder::ok("relational", &sql), Recorder::ok("search", &search))
                .unwrap();
            d.run_ticks(50, &mut NoopObserver);
            sql.all()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn relational_failure_keeps_search_and_ticking() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        let mut d = DriverBuilder::new(SensorType::Temperature, &reg)
            .seed(42)
            .build(Recorder::failing("relational", &sql), Recorder::ok("search", &search))
            .unwrap();

        d.run_ticks(10, &mut NoopObserver);
        assert_eq!(d.state(), DriverState::Running);
        assert_eq!(sql.batch_sizes(), [10, 10], "relational write was attempted");
        assert_eq!(search.batch_sizes(), [10, 10], "search still received both batches");
        assert_eq!(d.pending(), 0, "failed rows are dropped");

        d.run_ticks(5, &mut NoopObserver);
        assert_eq!(d.summary().ticks, 15);
        assert_eq!(d.summary().failed_flushes, 3);
    }

    #[test]
    fn shutdown_flushes_partial_buffer() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        let mut d = temperature_driver(&reg, &sql, &search);
        let mut obs = Counting::default();
        d.run_ticks(7, &mut obs);
        assert_eq!(d.pending(), 4);

        let summary = d.shutdown(&mut obs);
        assert_eq!(sql.batch_sizes(), [10, 4]);
        assert_eq!(summary.flushes, 2);
        assert_eq!(obs.stopped.as_ref(), Some(&summary));

        // Stopped drivers neither tick nor flush again.
        assert_eq!(d.tick(&mut obs), 0);
        assert_eq!(d.shutdown(&mut obs), summary);
        assert_eq!(sql.batch_sizes(), [10, 4]);
    }

    #[test]
    fn drop_flushes_pending() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        {
            let mut d = temperature_driver(&reg, &sql, &search);
            d.run_ticks(3, &mut NoopObserver);
        }
        assert_eq!(sql.batch_sizes(), [6]);
        assert_eq!(search.batch_sizes(), [6]);
    }
}

// ── run() and the stop flag ───────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn preset_stop_runs_no_ticks() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let mut d = temperature_driver(&reg, &log, &log);
        let stop = AtomicBool::new(true);
        let summary = d.run(&stop, &mut NoopObserver);
        assert_eq!(summary.ticks, 0);
        assert_eq!(d.state(), DriverState::Stopped);
        assert!(log.batch_sizes().is_empty());
    }

    #[test]
    fn max_ticks_bounds_run() {
        let reg = two_sensor_registry();
        let (sql, search) = (Log::default(), Log::default());
        let mut d = DriverBuilder::new(SensorType::Temperature, &reg)
            .seed(3)
            .tick_interval(Duration::ZERO)
            .max_ticks(7)
            .build(Recorder::ok("relational", &sql), Recorder::ok("search", &search))
            .unwrap();
        let summary = d.run(&AtomicBool::new(false), &mut NoopObserver);
        assert_eq!(summary.ticks, 7);
        assert_eq!(summary.measurements, 14);
        assert_eq!(sql.batch_sizes(), [10, 4]);
    }

    #[test]
    fn stop_from_another_thread() {
        let reg = two_sensor_registry();
        let log = Log::default();
        let mut d = DriverBuilder::new(SensorType::Temperature, &reg)
            .seed(3)
            .tick_interval(Duration::from_millis(5))
            .build(Recorder::ok("relational", &log), Recorder::ok("search", &log))
            .unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let setter = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(60));
                stop.store(true, Ordering::Release);
            })
        };
        let summary = d.run(&stop, &mut NoopObserver);
        setter.join().unwrap();
        assert!(summary.ticks > 0);
        assert_eq!(d.state(), DriverState::Stopped);
        assert_eq!(d.pending(), 0);
    }
}

// ── Runner ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod runner_tests {
    use super::*;
    use crate::{Runner, RunnerConfig, SinkFactory};

    struct Factory {
        sql:    Log,
        search: Log,
    }

    impl SinkFactory for Factory {
        fn relational(&self, _t: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
            Ok(Box::new(Recorder::ok("relational", &self.sql)))
        }

        fn search(&self, _t: SensorType) -> OutputResult<Box<dyn MeasurementSink>> {
            Ok(Box::new(Recorder::ok("search", &self.search)))
        }
    }

    fn factory() -> Factory {
        Factory { sql: Log::default(), search: Log::default() }
    }

    #[test]
    fn bounded_run_over_builtin_fleet() {
        let reg = SensorRegistry::builtin();
        let f = factory();
        let config = RunnerConfig {
            seed: Some(11),
            tick_interval: Duration::ZERO,
            max_ticks: Some(5),
            progress_every: 0,
            ..RunnerConfig::default()
        };
        let handle = Runner::new(&reg, config).start(&f).unwrap();
        let summaries: Vec<DriverSummary> = handle.join().into_iter().map(Result::unwrap).collect();

        assert_eq!(summaries.len(), 5);
        for s in &summaries {
            assert_eq!(s.ticks, 5);
            assert_eq!(s.measurements, 5 * reg.sensors(s.sensor_type).len() as u64);
            assert_eq!(s.flushes, 1);
        }
        let total: u64 = summaries.iter().map(|s| s.measurements).sum();
        assert_eq!(f.sql.all().len() as u64, total);

        let mut threads = f.sql.threads.lock().unwrap().clone();
        threads.sort();
        threads.dedup();
        assert_eq!(
            threads,
            ["esd-driver", "humidity-driver", "particle-driver", "temperature-driver", "wind-driver"]
        );
    }

    #[test]
    fn request_stop_ends_every_driver() {
        let reg = SensorRegistry::builtin();
        let f = factory();
        let config = RunnerConfig {
            seed: Some(5),
            tick_interval: Duration::from_millis(5),
            progress_every: 0,
            ..RunnerConfig::default()
        };
        let handle = Runner::new(&reg, config)
            .sensor_types(&[SensorType::Esd, SensorType::Particle])
            .start(&f)
            .unwrap();
        std::thread::sleep(Duration::from_millis(50));
        handle.request_stop();
        let results = handle.join();
        assert_eq!(results.len(), 2);
        for r in results {
            let s = r.unwrap();
            assert!(s.ticks > 0);
        }
        assert!(f.sql.all().iter().all(|m| matches!(m.sensor_type, SensorType::Esd | SensorType::Particle)));
    }

    #[test]
    fn simulated_start_stamps_measurements() {
        let reg = SensorRegistry::builtin();
        let f = factory();
        let config = RunnerConfig {
            seed: Some(5),
            tick_interval: Duration::ZERO,
            start: Some(SimClock::backfill_default().start),
            max_ticks: Some(3),
            progress_every: 0,
            ..RunnerConfig::default()
        };
        Runner::new(&reg, config)
            .sensor_types(&[SensorType::WindDirection])
            .start(&f)
            .unwrap()
            .join();
        let last = f.sql.all().last().map(|m| sg_core::format_utc(m.timestamp));
        assert_eq!(last.as_deref(), Some("2025-07-15T09:32:02Z"));
    }

    #[test]
    fn repeated_type_starts_one_driver() {
        let reg = SensorRegistry::builtin();
        let f = factory();
        let config = RunnerConfig {
            seed: Some(2),
            tick_interval: Duration::ZERO,
            max_ticks: Some(2),
            progress_every: 0,
            ..RunnerConfig::default()
        };
        let results = Runner::new(&reg, config)
            .sensor_types(&[SensorType::Temperature, SensorType::Esd, SensorType::Temperature])
            .start(&f)
            .unwrap()
            .join();
        let types: Vec<SensorType> = results.into_iter().map(|r| r.unwrap().sensor_type).collect();
        assert_eq!(types, [SensorType::Temperature, SensorType::Esd]);
        let temps = f.sql.all().iter().filter(|m| m.sensor_type == SensorType::Temperature).count();
        assert_eq!(temps, 2 * reg.sensors(SensorType::Temperature).len());
    }

    #[test]
    fn empty_selection_rejected() {
        let reg = SensorRegistry::builtin();
        let f = factory();
        assert!(Runner::new(&reg, RunnerConfig::default()).sensor_types(&[]).start(&f).is_err());
    }
}
