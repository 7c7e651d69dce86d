//! `sg-engine` — the per-sensor-type simulation engine.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`state`]   | `Phase`, `ScopeState` — one evolving quantity                |
//! | [`store`]   | `StateStore` — every scope's state, indexed by `ScopeIdx`    |
//! | [`engine`]  | `SimulationEngine` — NORMAL/SPIKING/HOLDING/OUT_OF_RANGE     |
//! | [`sampler`] | per-sensor noisy readings from scope state                   |
//!
//! # Tick model
//!
//! 1. `SimulationEngine::advance` steps every scope once.
//! 2. `sample_group` draws one independent reading per sensor from the
//!    scope it belongs to.  Sensors sharing a zone differ only by noise.
//!
//! Everything is driven by a caller-owned [`SimRng`][sg_core::SimRng]; with
//! a fixed seed the produced series is fully reproducible.

pub mod engine;
pub mod sampler;
pub mod state;
pub mod store;


pub use engine::{SimulationEngine, ease, step};
pub use sampler::{finish_channel, sample, sample_group};
pub use state::{Phase, ScopeState};
pub use store::StateStore;
