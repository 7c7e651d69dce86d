//! Measurement sampler: one noisy reading per sensor from its scope's state.

use chrono::{DateTime, Utc};
use sg_core::{Measurement, Reading, Resolution, SensorGroup, SensorParams, SimRng};

use crate::{Phase, ScopeState, SimulationEngine};

/// Turn one channel value plus a pre-drawn noise term into a reading.
///
/// Pure: the same inputs always give the same output.  Order of operations:
/// add noise, clamp to the physical band, round to the display step, then
/// apply the NORMAL-phase ceiling substitution.
pub fn finish_channel(params: &SensorParams, channel: usize, phase: Phase, value: f64, noise: f64) -> f64 {
    let c = &params.channels[channel];
    let mut v = c.hard_band.clamp(value + noise);
    if let Some(step) = params.display_step {
        v = c.hard_band.clamp((v / step).round() * step);
    }
    if let Some(cap) = params.normal_ceiling {
        if phase == Phase::Normal && v >= cap.threshold {
            v = cap.substitute;
        }
    }
    v
}

/// Draw the noise term for `channel`.
fn noise(params: &SensorParams, channel: usize, rng: &mut SimRng) -> f64 {
    let amp = params.channels[channel].noise_amplitude;
    match params.resolution {
        Resolution::Continuous => rng.symmetric(amp),
        Resolution::Integer    => rng.int_inclusive(-amp, amp),
    }
}

/// Sample one reading from `state`.
pub fn sample(params: &SensorParams, state: &ScopeState, rng: &mut SimRng) -> Reading {
    let values: Vec<f64> = state
        .value
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let n = noise(params, i, rng);
            finish_channel(params, i, state.phase, *v, n)
        })
        .collect();
    Reading::from_channels(&values)
}

/// Sample every sensor of `group` from `engine`'s current state, stamping all
/// of them with `timestamp`.  Output order is registration order.
pub fn sample_group(
    engine:    &SimulationEngine,
    group:     &SensorGroup,
    timestamp: DateTime<Utc>,
    rng:       &mut SimRng,
) -> Vec<Measurement> {
    group
        .sensors
        .iter()
        .zip(&group.scope_of)
        .map(|(sensor, &scope)| {
            let reading = sample(engine.params(), engine.state(scope), rng);
            Measurement::new(sensor, timestamp, reading)
        })
        .collect()
}
