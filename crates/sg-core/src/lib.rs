//! `sg-core` — foundational types for the `sensorgen` telemetry simulator.
//!
//! This crate is a dependency of every other `sg-*` crate.  It has no `sg-*`
//! dependencies and few external ones (`rand`, `chrono`, `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`sensor`]      | `SensorType`, `Sensor`                                    |
//! | [`registry`]    | `SensorRegistry`, `SensorGroup` (zone → sensor mapping)   |
//! | [`params`]      | `SensorParams` and its per-type presets                   |
//! | [`measurement`] | `Measurement`, `Reading`                                  |
//! | [`ids`]         | `SensorIdx`, `ScopeIdx`                                   |
//! | [`time`]        | `Tick`, `SimClock`, `format_utc`                          |
//! | [`rng`]         | `SimRng` (one per Driver)                                 |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to `SensorType`.            |

pub mod error;
pub mod ids;
pub mod measurement;
pub mod params;
pub mod registry;
pub mod rng;
pub mod sensor;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{ScopeIdx, SensorIdx};
pub use measurement::{Measurement, Reading};
pub use params::{
    Band, ChannelParams, ExcursionShape, NormalCeiling, RecoveryRule, Resolution, SensorParams,
    SpikeProfile, StateScope,
};
pub use registry::{SensorGroup, SensorRegistry};
pub use rng::SimRng;
pub use sensor::{Sensor, SensorType};
pub use time::{SimClock, Tick, format_utc};
