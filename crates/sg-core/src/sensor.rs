//! Sensor types and the immutable `Sensor` record.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::CoreError;

/// The five simulated sensor families.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SensorType {
    Temperature,
    Humidity,
    #[cfg_attr(feature = "serde", serde(alias = "wind"))]
    WindDirection,
    Esd,
    Particle,
}

impl SensorType {
    /// Every sensor type, in launch order.
    pub const ALL: [SensorType; 5] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::WindDirection,
        SensorType::Esd,
        SensorType::Particle,
    ];

    /// Stable position in [`SensorType::ALL`]; used for RNG stream mixing.
    pub fn ordinal(self) -> usize {
        match self {
            SensorType::Temperature   => 0,
            SensorType::Humidity      => 1,
            SensorType::WindDirection => 2,
            SensorType::Esd           => 3,
            SensorType::Particle      => 4,
        }
    }

    /// Value written to the `sensor_type` column / document field.
    pub fn label(self) -> &'static str {
        match self {
            SensorType::Temperature   => "temperature",
            SensorType::Humidity      => "humidity",
            SensorType::WindDirection => "windDir",
            SensorType::Esd           => "esd",
            SensorType::Particle      => "particle",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SensorType::Temperature   => "°C",
            SensorType::Humidity      => "%RH",
            SensorType::WindDirection => "deg",
            SensorType::Esd           => "V",
            SensorType::Particle      => "PPM",
        }
    }

    /// Relational table holding this type's rows.
    pub fn table(self) -> &'static str {
        match self {
            SensorType::Temperature   => "temp_data",
            SensorType::Humidity      => "hum_data",
            SensorType::WindDirection => "wind_data",
            SensorType::Esd           => "esd_data",
            SensorType::Particle      => "lpm_data",
        }
    }

    /// Short lowercase name used for thread names, index names and CSV folders.
    pub fn slug(self) -> &'static str {
        match self {
            SensorType::Temperature   => "temperature",
            SensorType::Humidity      => "humidity",
            SensorType::WindDirection => "wind",
            SensorType::Esd           => "esd",
            SensorType::Particle      => "particle",
        }
    }

    /// `true` for the three-channel particle counter.
    pub fn is_multi_channel(self) -> bool {
        matches!(self, SensorType::Particle)
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for SensorType {
    type Err = CoreError;

    /// Accepts the slug, the label, the table name, or the common short forms
    /// (`temp`, `hum`, `lpm`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SensorType::ALL
            .into_iter()
            .find(|t| {
                lower == t.slug()
                    || lower == t.label().to_ascii_lowercase()
                    || lower == t.table()
                    || t.table().strip_suffix("_data") == Some(lower.as_str())
                    || (lower == "wind_direction" && *t == SensorType::WindDirection)
            })
            .ok_or_else(|| CoreError::UnknownSensorType(s.to_owned()))
    }
}

// ── Sensor ────────────────────────────────────────────────────────────────────

/// One virtual sensor.  Created once at startup, never mutated.
///
/// Identifiers are `Arc<str>` so every `Measurement` can carry them without
/// re-allocating per tick.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sensor {
    pub sensor_id:   Arc<str>,
    pub zone_id:     Arc<str>,
    pub sensor_type: SensorType,
}

impl Sensor {
    pub fn new(sensor_type: SensorType, sensor_id: &str, zone_id: &str) -> Self {
        Self {
            sensor_id: Arc::from(sensor_id),
            zone_id: Arc::from(zone_id),
            sensor_type,
        }
    }
}
