//! TOML configuration with defaults for every field.
//!
//! ```toml
//! [database]
//! path = "sensors.db"
//!
//! [search]
//! enabled = true
//! url = "http://localhost:9200"
//!
//! [simulation]
//! seed = 42
//! tick_ms = 1000
//! flush_factor = 5
//! sensor_types = ["temperature", "esd"]
//!
//! [logging]
//! format = "json"
//!
//! [[fleet.temperature]]
//! sensor_id = "temp-101"
//! zone_id = "a01"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sg_core::{SensorRegistry, SensorType};
use sg_output::{DEFAULT_FLUSH_FACTOR, SearchConfig};
use tracing::debug;

use crate::logging::LogFormat;

fn default_db_path() -> PathBuf {
    PathBuf::from("sensors.db")
}

fn default_search_url() -> String {
    "http://localhost:9200".to_owned()
}

fn default_index_prefix() -> String {
    "sensor".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_flush_factor() -> usize {
    DEFAULT_FLUSH_FACTOR
}

fn default_progress_every() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_true")]
    pub enabled:      bool,
    #[serde(default = "default_search_url")]
    pub url:          String,
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            enabled:      true,
            url:          default_search_url(),
            index_prefix: default_index_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SearchSection {
    /// Sink settings, or `None` when the search service is disabled.
    pub fn sink_config(&self) -> Option<SearchConfig> {
        self.enabled.then(|| SearchConfig {
            url:          self.url.clone(),
            index_prefix: self.index_prefix.clone(),
            timeout:      Duration::from_secs(self.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub seed:           Option<u64>,
    #[serde(default = "default_tick_ms")]
    pub tick_ms:        u64,
    #[serde(default = "default_flush_factor")]
    pub flush_factor:   usize,
    /// Empty means every type in the fleet.
    #[serde(default)]
    pub sensor_types:   Vec<SensorType>,
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed:           None,
            tick_ms:        default_tick_ms(),
            flush_factor:   default_flush_factor(),
            sensor_types:   Vec::new(),
            progress_every: default_progress_every(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directive used when neither `SENSORGEN_LOG` nor `RUST_LOG` is set.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetEntry {
    pub sensor_id: String,
    pub zone_id:   String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database:   DatabaseConfig,
    #[serde(default)]
    pub search:     SearchSection,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging:    LoggingConfig,
    /// Per-type replacements for the built-in fleet.
    #[serde(default)]
    pub fleet:      BTreeMap<SensorType, Vec<FleetEntry>>,
}

impl AppConfig {
    /// Defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The built-in fleet with any `[[fleet.<type>]]` tables swapped in.
    pub fn registry(&self) -> Result<SensorRegistry> {
        let builtin = SensorRegistry::builtin();
        let mut entries: Vec<(SensorType, String, String)> = Vec::new();
        for t in SensorType::ALL {
            match self.fleet.get(&t) {
                Some(custom) if custom.is_empty() => {
                    bail!("fleet.{} lists no sensors", t.slug());
                }
                Some(custom) => entries.extend(
                    custom
                        .iter()
                        .map(|e| (t, e.sensor_id.clone(), e.zone_id.clone())),
                ),
                None => entries.extend(
                    builtin
                        .sensors(t)
                        .iter()
                        .map(|s| (t, s.sensor_id.to_string(), s.zone_id.to_string())),
                ),
            }
        }
        let registry = SensorRegistry::from_entries(
            entries.iter().map(|(t, id, zone)| (*t, id.as_str(), zone.as_str())),
        )
        .context("invalid fleet configuration")?;
        Ok(registry)
    }

    /// Selected sensor types, in launch order.
    pub fn selected_types(&self, registry: &SensorRegistry) -> Vec<SensorType> {
        if self.simulation.sensor_types.is_empty() {
            registry.sensor_types().collect()
        } else {
            let mut types = Vec::with_capacity(self.simulation.sensor_types.len());
            for &t in &self.simulation.sensor_types {
                if !types.contains(&t) {
                    types.push(t);
                }
            }
            types
        }
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms)
    }
}
