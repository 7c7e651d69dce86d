//! Per-scope simulation state.

use std::fmt;

use sg_core::{Resolution, SensorParams, SimRng};

/// The regime a simulated quantity is in.  The phase alone decides which
/// transition rule the next tick applies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Normal,
    Spiking,
    Holding,
    OutOfRange,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Normal     => "NORMAL",
            Phase::Spiking    => "SPIKING",
            Phase::Holding    => "HOLDING",
            Phase::OutOfRange => "OUT_OF_RANGE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evolving quantity for one zone (or one sensor).
///
/// Vectors hold one entry per channel.  Every channel moves through the
/// phases together, sharing `phase` and the step counters.
///
/// Invariants: `spike_step <= spike_duration`, `hold_step <= hold_duration`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeState {
    pub value:          Vec<f64>,
    pub phase:          Phase,
    pub spike_step:     u32,
    pub spike_duration: u32,
    pub spike_start:    Vec<f64>,
    pub spike_target:   Vec<f64>,
    pub hold_step:      u32,
    pub hold_duration:  u32,
}

impl ScopeState {
    /// A NORMAL state at `value`, with spike start/target parked on it.
    pub fn normal(value: Vec<f64>, params: &SensorParams) -> Self {
        Self {
            spike_start:    value.clone(),
            spike_target:   value.clone(),
            value,
            phase:          Phase::Normal,
            spike_step:     0,
            spike_duration: params.spike_duration,
            hold_step:      0,
            hold_duration:  params.hold_duration,
        }
    }

    /// A NORMAL state placed randomly within the normal half-range of each
    /// channel's nominal, clamped into the walk band.
    pub fn randomized(params: &SensorParams, rng: &mut SimRng) -> Self {
        let value = params
            .channels
            .iter()
            .map(|c| {
                let offset = match params.resolution {
                    Resolution::Continuous => rng.symmetric(c.normal_half_range),
                    Resolution::Integer => {
                        rng.int_inclusive(-c.normal_half_range, c.normal_half_range)
                    }
                };
                c.walk_band.clamp(c.nominal + offset)
            })
            .collect();
        Self::normal(value, params)
    }

    /// Force the state into SPIKING from `start` toward `target`, at step 0.
    pub fn force_spike(&mut self, start: Vec<f64>, target: Vec<f64>, duration: u32) {
        self.value = start.clone();
        self.spike_start = start;
        self.spike_target = target;
        self.spike_step = 0;
        self.spike_duration = duration;
        self.phase = Phase::Spiking;
    }

    /// The single-channel value.  For multi-channel states, the first channel.
    #[inline]
    pub fn scalar(&self) -> f64 {
        self.value[0]
    }
}
