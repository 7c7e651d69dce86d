//! Configuration error type shared by every `sg-*` crate.
//!
//! Everything in here is raised before a tick loop starts.  Sub-crates wrap
//! `CoreError` as one variant of their own enums via `#[from]`.

use thiserror::Error;

use crate::SensorType;

/// The top-level error type for `sg-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("no sensors registered for {0}")]
    EmptyFleet(SensorType),

    #[error("sensor id {0:?} registered more than once")]
    DuplicateSensor(String),

    #[error("unknown sensor type {0:?}")]
    UnknownSensorType(String),

    #[error("invalid parameters for {sensor_type}: {reason}")]
    InvalidParams {
        sensor_type: SensorType,
        reason:      String,
    },
}

/// Shorthand result type for all `sg-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
