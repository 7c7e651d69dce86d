//! `sg-driver` — per-sensor-type tick loop and the multi-threaded runner.
//!
//! # Tick loop
//!
//! ```text
//! while RUNNING and stop flag clear:
//!   ① Advance   — SimulationEngine::advance steps every zone/sensor state.
//!   ② Sample    — one noisy Measurement per sensor, stamped with the tick time.
//!   ③ Buffer    — append to both staging queues of the BatchBuffer.
//!   ④ Flush     — if buffered ≥ sensor_count × flush_factor, drain into the
//!                 relational sink, then the search sink.
//!   ⑤ Wait      — sleep out the rest of the tick interval.
//! STOPPING: final flush of anything buffered, finish both sinks.
//! STOPPED.
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sg_driver::{Runner, RunnerConfig};
//!
//! let handle = Runner::new(&registry, RunnerConfig::default()).start(&factory)?;
//! // ... on Ctrl-C:
//! handle.request_stop();
//! for summary in handle.join() { println!("{:?}", summary?); }
//! ```

pub mod builder;
pub mod driver;
pub mod error;
pub mod observer;
pub mod runner;

#[cfg(test)]
mod tests;

pub use builder::DriverBuilder;
pub use driver::{Driver, DriverState, DriverSummary, TimeSource};
pub use error::{DriverError, DriverResult};
pub use observer::{DriverObserver, LoggingObserver, NoopObserver};
pub use runner::{Runner, RunnerConfig, RunnerHandle, SinkFactory};
