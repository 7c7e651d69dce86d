//! The `Measurement` record produced by the sampler and consumed by sinks.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{Sensor, SensorType};

/// A sampled value: one number, or the three particle-size channels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reading {
    Scalar(f64),
    /// Counts for 0.1 µm, 0.3 µm and 0.5 µm particles, in that order.
    Particle([f64; 3]),
}

impl Reading {
    /// Build a reading from per-channel values.  Anything that is not exactly
    /// three channels is reported by its first channel.
    pub fn from_channels(values: &[f64]) -> Self {
        match values {
            [a, b, c] => Reading::Particle([*a, *b, *c]),
            [v, ..] => Reading::Scalar(*v),
            [] => Reading::Scalar(f64::NAN),
        }
    }

    /// The primary value (`val`, or the 0.1 µm channel).
    pub fn primary(&self) -> f64 {
        match self {
            Reading::Scalar(v) => *v,
            Reading::Particle([v, _, _]) => *v,
        }
    }

    pub fn channels(&self) -> &[f64] {
        match self {
            Reading::Scalar(v) => std::slice::from_ref(v),
            Reading::Particle(v) => v,
        }
    }
}

/// One reading from one sensor at one tick.
///
/// Cheap to clone: identifiers are shared `Arc<str>`s from the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub timestamp:   DateTime<Utc>,
    pub sensor_type: SensorType,
    pub sensor_id:   Arc<str>,
    pub zone_id:     Arc<str>,
    pub reading:     Reading,
}

impl Measurement {
    pub fn new(sensor: &Sensor, timestamp: DateTime<Utc>, reading: Reading) -> Self {
        Self {
            timestamp,
            sensor_type: sensor.sensor_type,
            sensor_id: sensor.sensor_id.clone(),
            zone_id: sensor.zone_id.clone(),
            reading,
        }
    }

    #[inline]
    pub fn unit(&self) -> &'static str {
        self.sensor_type.unit()
    }
}
