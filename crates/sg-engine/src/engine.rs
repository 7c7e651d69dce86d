//! The generic four-phase state machine.
//!
//! ```text
//!            p_excursion                spike_step == spike_duration
//!   NORMAL ──────────────▶ SPIKING ───────────────────────────────▶ HOLDING
//!     ▲                       │ (no hold phase)                        │
//!     │                       ▼                  hold_step == hold_dur │
//!     └──── re-entry ──── OUT_OF_RANGE ◀───────────────────────────────┘
//! ```
//!
//! One `advance` call moves every scope exactly one tick.

use sg_core::{
    CoreError, CoreResult, ExcursionShape, RecoveryRule, Resolution, ScopeIdx, SensorGroup,
    SensorParams, SimRng, SpikeProfile,
};
use tracing::debug;

use crate::{Phase, ScopeState, StateStore};

/// Exponential ease-in used while SPIKING.
///
/// `ease(0) == 0`, `ease(1) == 1`, monotone in between.
#[inline]
pub fn ease(t: f64) -> f64 {
    (1.0 - (-3.0 * t).exp()) / (1.0 - (-3.0f64).exp())
}

/// Owns the parameters and the state store for one sensor type.
pub struct SimulationEngine {
    params: SensorParams,
    store:  StateStore,
}

impl SimulationEngine {
    /// Build an engine with one randomized NORMAL state per scope in `group`.
    ///
    /// # Errors
    ///
    /// - `InvalidParams` if `params` fails validation.
    /// - `Config` if `group` has no scopes or was grouped with a different
    ///   scope kind than `params` asks for.
    pub fn new(params: SensorParams, group: &SensorGroup, rng: &mut SimRng) -> CoreResult<Self> {
        params.validate()?;
        if group.scope != params.scope {
            return Err(CoreError::Config(format!(
                "{} sensors were grouped per {:?} but the engine expects per {:?}",
                params.sensor_type, group.scope, params.scope
            )));
        }
        if group.scope_count() == 0 {
            return Err(CoreError::EmptyFleet(params.sensor_type));
        }
        let store = StateStore::for_group(group, &params, rng);
        Ok(Self { params, store })
    }

    #[inline]
    pub fn params(&self) -> &SensorParams {
        &self.params
    }

    #[inline]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    #[inline]
    pub fn state(&self, scope: ScopeIdx) -> &ScopeState {
        self.store.get(scope)
    }

    /// Advance every scope one tick, in scope order.
    pub fn advance(&mut self, rng: &mut SimRng) {
        let params = &self.params;
        for (state, key) in self.store.states.iter_mut().zip(&self.store.keys) {
            let before = state.phase;
            step(state, params, rng);
            if state.phase != before {
                debug!(
                    sensor_type = %params.sensor_type,
                    scope = %key,
                    from = %before,
                    to = %state.phase,
                    value = state.scalar(),
                    "phase transition"
                );
            }
        }
    }
}

/// Advance one state by one tick.
pub fn step(state: &mut ScopeState, params: &SensorParams, rng: &mut SimRng) {
    match state.phase {
        Phase::Normal => {
            if rng.gen_bool(params.excursion_prob) {
                begin_spike(state, params, rng);
            } else {
                walk(state, params, rng);
            }
        }
        Phase::Spiking    => spike(state, params),
        Phase::Holding    => hold(state),
        Phase::OutOfRange => recover(state, params, rng),
    }
}

// ── NORMAL ────────────────────────────────────────────────────────────────────

fn walk(state: &mut ScopeState, params: &SensorParams, rng: &mut SimRng) {
    // One bias draw per tick keeps channels moving together.
    let toward = rng.gen_bool(params.bias_prob);
    for (v, c) in state.value.iter_mut().zip(&params.channels) {
        let mut delta = match params.resolution {
            Resolution::Continuous => rng.symmetric(c.walk_delta),
            Resolution::Integer    => rng.int_inclusive(-c.walk_delta, c.walk_delta),
        };
        if toward {
            delta = if *v < c.nominal { delta.abs() } else { -delta.abs() };
        }
        *v = c.walk_band.clamp(*v + delta);
    }
}

fn begin_spike(state: &mut ScopeState, params: &SensorParams, rng: &mut SimRng) {
    let below = rng.gen_bool(0.5);
    let target = params
        .channels
        .iter()
        .map(|c| {
            let (lo, hi) = match params.excursion {
                ExcursionShape::Bipolar if below => (c.nominal - c.out_half_range, c.walk_band.min),
                ExcursionShape::Bipolar => (c.walk_band.max, c.nominal + c.out_half_range),
                ExcursionShape::Above => {
                    (c.recover_band.max, c.recover_band.max + c.out_half_range)
                }
            };
            let t = match params.resolution {
                Resolution::Continuous => rng.uniform(lo, hi),
                Resolution::Integer    => rng.int_inclusive(lo, hi),
            };
            c.hard_band.clamp(t)
        })
        .collect();

    let start = state.value.clone();
    state.force_spike(start, target, params.spike_duration);
    state.hold_step = 0;
    state.hold_duration = params.hold_duration;
}

// ── SPIKING / HOLDING ─────────────────────────────────────────────────────────

fn spike(state: &mut ScopeState, params: &SensorParams) {
    state.spike_step = (state.spike_step + 1).min(state.spike_duration);

    if state.spike_step >= state.spike_duration {
        // Land on the target exactly; interpolation would leave float residue.
        state.value.clone_from(&state.spike_target);
        if params.has_hold_phase {
            state.hold_step = 0;
            state.phase = Phase::Holding;
        } else {
            state.phase = Phase::OutOfRange;
        }
        return;
    }

    if params.spike_profile == SpikeProfile::Snap {
        return;
    }

    let t = state.spike_step as f64 / state.spike_duration as f64;
    let factor = ease(t);
    for ((v, start), target) in state
        .value
        .iter_mut()
        .zip(&state.spike_start)
        .zip(&state.spike_target)
    {
        let x = start + (target - start) * factor;
        *v = match params.resolution {
            Resolution::Continuous => x,
            Resolution::Integer    => x.trunc(),
        };
    }
}

fn hold(state: &mut ScopeState) {
    state.value.clone_from(&state.spike_target);
    state.hold_step = (state.hold_step + 1).min(state.hold_duration);
    if state.hold_step >= state.hold_duration {
        state.phase = Phase::OutOfRange;
    }
}

// ── OUT_OF_RANGE ──────────────────────────────────────────────────────────────

fn draw(rng: &mut SimRng, resolution: Resolution, (lo, hi): (f64, f64)) -> f64 {
    match resolution {
        Resolution::Continuous => rng.uniform(lo, hi),
        Resolution::Integer    => rng.int_inclusive(lo, hi),
    }
}

fn recover(state: &mut ScopeState, params: &SensorParams, rng: &mut SimRng) {
    let res = params.resolution;
    match params.recovery {
        RecoveryRule::Drift { step_min, step_max } => {
            let toward = rng.gen_bool(params.recover_prob);
            for (v, c) in state.value.iter_mut().zip(&params.channels) {
                let step = draw(rng, res, (step_min, step_max));
                let signed = if toward { step } else { -step };
                let next = if *v < c.nominal { *v + signed } else { *v - signed };
                *v = c.hard_band.clamp(next);
            }
        }
        RecoveryRule::Jump { toward, away } => {
            let range = if rng.gen_bool(params.recover_prob) { toward } else { away };
            for (v, c) in state.value.iter_mut().zip(&params.channels) {
                *v = c.hard_band.clamp(*v + draw(rng, res, range));
            }
        }
        RecoveryRule::Settle { descend, linger, ascend } => {
            for (v, c) in state.value.iter_mut().zip(&params.channels) {
                let delta = if *v > c.recover_band.max {
                    if rng.gen_bool(params.recover_prob) {
                        -draw(rng, res, descend)
                    } else {
                        draw(rng, res, linger)
                    }
                } else if *v < c.recover_band.min {
                    draw(rng, res, ascend)
                } else {
                    0.0
                };
                *v = c.hard_band.clamp(*v + delta);
            }
        }
    }

    let back_in_band = state
        .value
        .iter()
        .zip(&params.channels)
        .all(|(v, c)| c.recover_band.contains(*v));
    if back_in_band {
        state.phase = Phase::Normal;
    }
}
