//! Plain row and document shapes written by the sink backends.

use serde::Serialize;
use sg_core::{Measurement, Reading, SensorType, format_utc};

/// Columns holding the reading for `sensor_type`, in channel order.
pub fn value_columns(sensor_type: SensorType) -> &'static [&'static str] {
    if sensor_type.is_multi_channel() {
        &["val_0_1um", "val_0_3um", "val_0_5um"]
    } else {
        &["val"]
    }
}

/// Relational timestamp format (`DATETIME`-compatible, UTC, no zone suffix).
pub fn sql_timestamp(m: &Measurement) -> String {
    m.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One document in the search index.
///
/// Particle documents carry the three size channels as extra fields and
/// report the 0.1 µm count as `val` so every index shares one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocument<'a> {
    pub sensor_id:   &'a str,
    pub zone_id:     &'a str,
    pub timestamp:   String,
    pub sensor_type: &'static str,
    pub unit:        &'static str,
    pub val:         f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_0_1um:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_0_3um:   Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_0_5um:   Option<f64>,
}

impl<'a> From<&'a Measurement> for SearchDocument<'a> {
    fn from(m: &'a Measurement) -> Self {
        let (p1, p3, p5) = match m.reading {
            Reading::Particle([a, b, c]) => (Some(a), Some(b), Some(c)),
            Reading::Scalar(_) => (None, None, None),
        };
        Self {
            sensor_id:   &m.sensor_id,
            zone_id:     &m.zone_id,
            timestamp:   format_utc(m.timestamp),
            sensor_type: m.sensor_type.label(),
            unit:        m.unit(),
            val:         m.reading.primary(),
            val_0_1um:   p1,
            val_0_3um:   p3,
            val_0_5um:   p5,
        }
    }
}
