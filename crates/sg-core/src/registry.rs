//! The Sensor Registry — a static zone → sensor assignment per sensor type.
//!
//! The registry is built once at startup, validated, and then shared
//! read-only (behind an `Arc`) by every Driver thread.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::{CoreError, CoreResult, ScopeIdx, Sensor, SensorIdx, SensorType, StateScope};

/// All sensors, grouped by type, in registration order.
#[derive(Clone, Debug, Default)]
pub struct SensorRegistry {
    by_type: BTreeMap<SensorType, Vec<Sensor>>,
}

impl SensorRegistry {
    /// Build a registry from `(type, sensor_id, zone_id)` triples.
    ///
    /// # Errors
    ///
    /// - `Config` if a sensor or zone id is blank.
    /// - `DuplicateSensor` if the same sensor id appears twice (across all
    ///   types).
    pub fn from_entries<'a, I>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (SensorType, &'a str, &'a str)>,
    {
        let mut by_type: BTreeMap<SensorType, Vec<Sensor>> = BTreeMap::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (sensor_type, sensor_id, zone_id) in entries {
            let (sensor_id, zone_id) = (sensor_id.trim(), zone_id.trim());
            if sensor_id.is_empty() {
                return Err(CoreError::Config(format!("blank sensor id in {sensor_type} fleet")));
            }
            if zone_id.is_empty() {
                return Err(CoreError::Config(format!("sensor {sensor_id} has a blank zone id")));
            }
            if !seen.insert(sensor_id.to_owned()) {
                return Err(CoreError::DuplicateSensor(sensor_id.to_owned()));
            }
            by_type
                .entry(sensor_type)
                .or_default()
                .push(Sensor::new(sensor_type, sensor_id, zone_id));
        }
        Ok(Self { by_type })
    }

    /// The fleet the simulator ships with: 12 temperature, 12 humidity,
    /// 10 wind, 12 ESD and 9 particle sensors across zones a01–c02.
    pub fn builtin() -> Self {
        let mut entries: Vec<(SensorType, String, &'static str)> = Vec::new();
        for (sensor_type, prefix, zones) in BUILTIN_FLEET {
            for (i, zone) in zones.iter().enumerate() {
                entries.push((*sensor_type, format!("{prefix}-{:03}", i + 1), zone));
            }
        }
        // The built-in table has unique, non-blank ids; `from_entries` cannot fail.
        Self::from_entries(entries.iter().map(|(t, id, z)| (*t, id.as_str(), *z)))
            .unwrap_or_default()
    }

    /// Sensors of `sensor_type`, in registration order.  Empty if none.
    pub fn sensors(&self, sensor_type: SensorType) -> &[Sensor] {
        self.by_type.get(&sensor_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sensor types that have at least one sensor.
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.by_type
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(t, _)| *t)
    }

    /// Total number of sensors across all types.
    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the sensors of one type into dense scope indices.
    ///
    /// # Errors
    ///
    /// `EmptyFleet` if no sensor of `sensor_type` is registered.
    pub fn group(&self, sensor_type: SensorType, scope: StateScope) -> CoreResult<SensorGroup> {
        let sensors = self.sensors(sensor_type);
        if sensors.is_empty() {
            return Err(CoreError::EmptyFleet(sensor_type));
        }
        Ok(SensorGroup::new(sensor_type, sensors.to_vec(), scope))
    }
}

/// The sensors of one type plus the sensor → scope mapping the engine uses.
///
/// Scope keys are zone ids for [`StateScope::Zone`] (first-seen order) and
/// sensor ids for [`StateScope::Sensor`].
#[derive(Clone, Debug)]
pub struct SensorGroup {
    pub sensor_type: SensorType,
    pub scope:       StateScope,
    pub sensors:     Vec<Sensor>,
    /// `scope_of[sensor_idx]`: the state each sensor samples from.
    pub scope_of:    Vec<ScopeIdx>,
    /// `scope_keys[scope_idx]`: the zone or sensor id naming that state.
    pub scope_keys:  Vec<Arc<str>>,
}

impl SensorGroup {
    fn new(sensor_type: SensorType, sensors: Vec<Sensor>, scope: StateScope) -> Self {
        let mut index: HashMap<Arc<str>, ScopeIdx> = HashMap::new();
        let mut scope_keys: Vec<Arc<str>> = Vec::new();
        let mut scope_of = Vec::with_capacity(sensors.len());

        for sensor in &sensors {
            let key = match scope {
                StateScope::Zone   => sensor.zone_id.clone(),
                StateScope::Sensor => sensor.sensor_id.clone(),
            };
            let idx = *index.entry(key.clone()).or_insert_with(|| {
                scope_keys.push(key);
                ScopeIdx((scope_keys.len() - 1) as u32)
            });
            scope_of.push(idx);
        }

        Self { sensor_type, scope, sensors, scope_of, scope_keys }
    }

    #[inline]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    #[inline]
    pub fn scope_count(&self) -> usize {
        self.scope_keys.len()
    }

    #[inline]
    pub fn scope_of(&self, sensor: SensorIdx) -> ScopeIdx {
        self.scope_of[sensor.index()]
    }
}

/// `(type, id prefix, zone per sensor)`; sensor ids are `<prefix>-NNN`.
const BUILTIN_FLEET: &[(SensorType, &str, &[&str])] = &[
    (
        SensorType::Temperature,
        "temp",
        &["a01", "a01", "a02", "a02", "b01", "b02", "b03", "b04", "c01", "c01", "c02", "c02"],
    ),
    (
        SensorType::Humidity,
        "hum",
        &["a01", "a01", "a01", "a01", "a02", "a02", "b01", "b02", "b03", "b04", "c01", "c02"],
    ),
    (
        SensorType::WindDirection,
        "wind",
        &["a01", "a01", "a02", "a02", "b01", "b02", "b03", "b04", "c01", "c02"],
    ),
    (
        SensorType::Esd,
        "esd",
        &["a01", "a01", "a01", "a01", "a02", "a02", "b01", "b02", "b03", "b04", "c01", "c02"],
    ),
    (
        SensorType::Particle,
        "lpm",
        &["a01", "a01", "a02", "a02", "b01", "b02", "b03", "b04", "c01"],
    ),
];
