//! Per-sensor-type simulation parameters.
//!
//! One [`SensorParams`] record drives the generic engine for every sensor
//! family.  The behavioural quirks that differ between families (unipolar
//! clamping for ESD, three correlated channels for particle counts, integer
//! resolution for wind/ESD/particle) are variants selected here, not separate
//! code paths in the engine.
//!
//! # Bands
//!
//! Each channel carries three closed intervals:
//!
//! | Band           | Used by                                                  |
//! |----------------|----------------------------------------------------------|
//! | `walk_band`    | NORMAL random walk is clamped into it                    |
//! | `recover_band` | OUT_OF_RANGE → NORMAL once every channel lies inside it  |
//! | `hard_band`    | physical floor/ceiling for state and sampled readings    |
//!
//! For bipolar quantities `walk_band == recover_band`.  ESD is unipolar: it
//! walks in `[0, 80]` but only counts as recovered once back in `[0, 100]`.

use crate::{CoreError, CoreResult, SensorType};

/// Closed interval `[min, max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `[center - half, center + half]`.
    pub fn around(center: f64, half: f64) -> Self {
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    #[inline]
    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.min).min(self.max)
    }

    fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    fn within(&self, outer: &Band) -> bool {
        outer.min <= self.min && self.max <= outer.max
    }
}

/// Whether one evolving quantity is shared by every sensor in a zone or owned
/// by a single sensor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateScope {
    Zone,
    Sensor,
}

/// Numeric resolution of the state and of sampled readings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Real-valued; deltas are drawn uniformly.
    Continuous,
    /// Whole numbers; deltas are drawn as inclusive integer ranges and eased
    /// interpolation truncates toward zero.
    Integer,
}

/// Where a spike target is drawn when a NORMAL quantity starts an excursion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExcursionShape {
    /// Equal odds of `[nominal - out, walk.min]` or `[walk.max, nominal + out]`.
    Bipolar,
    /// Always above: `recover.max + U[0, out_half_range]`.
    Above,
}

/// How SPIKING moves from `spike_start` to `spike_target`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpikeProfile {
    /// Exponential ease-in, `(1 - e^(-3t)) / (1 - e^(-3))`.
    Eased,
    /// Value stays put for `spike_duration` ticks, then jumps to the target.
    Snap,
}

/// Biased step applied each OUT_OF_RANGE tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RecoveryRule {
    /// With `recover_prob` step `U[step_min, step_max]` toward nominal,
    /// otherwise the same magnitude away from it.
    Drift { step_min: f64, step_max: f64 },
    /// With `recover_prob` add a delta from `toward`, otherwise from `away`.
    /// Ranges are signed and independent of which side of nominal the value
    /// is on (unipolar quantities only ever overshoot upward).
    Jump { toward: (f64, f64), away: (f64, f64) },
    /// Per channel: above the band descend by `descend` with `recover_prob`
    /// (else creep by `linger`), below the band climb by `ascend`.  Values
    /// are floored at `hard_band.min`.
    Settle {
        descend: (f64, f64),
        linger:  (f64, f64),
        ascend:  (f64, f64),
    },
}

/// Sampler rule: while NORMAL, a reading at or above `threshold` is replaced
/// by `substitute`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NormalCeiling {
    pub threshold:  f64,
    pub substitute: f64,
}

/// Constants for one channel of a sensor type.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelParams {
    /// Column / field suffix (`val`, `val_0_1um`, …).
    pub label:             &'static str,
    pub nominal:           f64,
    pub normal_half_range: f64,
    /// Reach of an excursion target beyond the normal band.
    pub out_half_range:    f64,
    pub walk_band:         Band,
    pub recover_band:      Band,
    pub hard_band:         Band,
    /// Magnitude of the NORMAL random-walk step.
    pub walk_delta:        f64,
    pub noise_amplitude:   f64,
}

/// The configuration record for one sensor type.
#[derive(Clone, Debug, PartialEq)]
pub struct SensorParams {
    pub sensor_type:     SensorType,
    pub scope:           StateScope,
    pub resolution:      Resolution,
    pub channels:        Vec<ChannelParams>,
    /// Probability per tick that a NORMAL quantity starts an excursion.
    pub excursion_prob:  f64,
    /// Probability that a NORMAL walk step is forced toward nominal.
    pub bias_prob:       f64,
    /// Probability that an OUT_OF_RANGE step moves back toward the band.
    pub recover_prob:    f64,
    pub excursion:       ExcursionShape,
    pub spike_profile:   SpikeProfile,
    pub spike_duration:  u32,
    pub has_hold_phase:  bool,
    pub hold_duration:   u32,
    pub recovery:        RecoveryRule,
    /// Readings are rounded to a multiple of this step (e.g. 0.25 °C).
    pub display_step:    Option<f64>,
    pub normal_ceiling:  Option<NormalCeiling>,
}

const SPIKE_DURATION: u32 = 10;
const HOLD_DURATION:  u32 = 25;

impl SensorParams {
    /// The built-in parameter set for `sensor_type`.
    pub fn for_type(sensor_type: SensorType) -> Self {
        match sensor_type {
            SensorType::Temperature   => Self::temperature(),
            SensorType::Humidity      => Self::humidity(),
            SensorType::WindDirection => Self::wind_direction(),
            SensorType::Esd           => Self::esd(),
            SensorType::Particle      => Self::particle(),
        }
    }

    /// Number of channels (1 for scalars, 3 for particle counts).
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn temperature() -> Self {
        Self::bipolar_scalar(SensorType::Temperature, BipolarScalar {
            nominal:        21.0,
            normal_half:    1.0,
            out_half:       3.0,
            hard:           Band::new(17.0, 25.0),
            walk_delta:     0.1,
            noise:          0.25,
            excursion_prob: 0.01,
            bias_prob:      0.3,
            step:           (0.05, 0.10),
        })
    }

    pub fn humidity() -> Self {
        Self::bipolar_scalar(SensorType::Humidity, BipolarScalar {
            nominal:        45.0,
            normal_half:    5.0,
            out_half:       7.0,
            hard:           Band::new(0.0, 100.0),
            walk_delta:     0.5,
            noise:          0.25,
            excursion_prob: 0.001,
            bias_prob:      0.3,
            step:           (0.05, 0.055),
        })
    }

    pub fn wind_direction() -> Self {
        let mut p = Self::bipolar_scalar(SensorType::WindDirection, BipolarScalar {
            nominal:        0.0,
            normal_half:    14.0,
            out_half:       20.0,
            hard:           Band::new(-180.0, 180.0),
            walk_delta:     3.0,
            noise:          1.0,
            excursion_prob: 0.001,
            bias_prob:      0.8,
            step:           (1.0, 1.0),
        });
        p.scope = StateScope::Sensor;
        p.resolution = Resolution::Integer;
        p.display_step = None;
        p
    }

    pub fn esd() -> Self {
        let nominal = 50.0;
        let half = 30.0;
        Self {
            sensor_type:    SensorType::Esd,
            scope:          StateScope::Sensor,
            resolution:     Resolution::Integer,
            channels:       vec![ChannelParams {
                label:             "val",
                nominal,
                normal_half_range: half,
                out_half_range:    20.0,
                walk_band:         Band::new(0.0, nominal + half),
                recover_band:      Band::new(0.0, 100.0),
                hard_band:         Band::new(0.0, 1_000.0),
                walk_delta:        25.0,
                noise_amplitude:   5.0,
            }],
            excursion_prob: 0.001,
            bias_prob:      0.3,
            recover_prob:   0.98,
            excursion:      ExcursionShape::Above,
            spike_profile:  SpikeProfile::Snap,
            spike_duration: SPIKE_DURATION,
            has_hold_phase: false,
            hold_duration:  0,
            recovery:       RecoveryRule::Jump {
                toward: (-100.0, 5.0),
                away:   (-10.0, 5.0),
            },
            display_step:   None,
            normal_ceiling: Some(NormalCeiling { threshold: 100.0, substitute: nominal + half }),
        }
    }

    pub fn particle() -> Self {
        let channel = |label, nominal: f64, half: f64, reach, walk_delta| ChannelParams {
            label,
            nominal,
            normal_half_range: half,
            out_half_range:    reach,
            walk_band:         Band::new(0.0, nominal + half),
            recover_band:      Band::new(0.0, nominal + half),
            hard_band:         Band::new(0.0, 100_000.0),
            walk_delta,
            noise_amplitude:   1.0,
        };
        Self {
            sensor_type:    SensorType::Particle,
            scope:          StateScope::Sensor,
            resolution:     Resolution::Integer,
            channels:       vec![
                channel("val_0_1um", 850.0, 150.0, 50.0, 40.0),
                channel("val_0_3um", 82.0, 20.0, 20.0, 5.0),
                channel("val_0_5um", 20.0, 15.0, 5.0, 1.0),
            ],
            excursion_prob: 0.0008,
            bias_prob:      0.3,
            recover_prob:   0.8,
            excursion:      ExcursionShape::Above,
            spike_profile:  SpikeProfile::Eased,
            spike_duration: SPIKE_DURATION,
            has_hold_phase: true,
            hold_duration:  HOLD_DURATION,
            recovery:       RecoveryRule::Settle {
                descend: (1.0, 3.0),
                linger:  (0.0, 1.0),
                ascend:  (1.0, 2.0),
            },
            display_step:   None,
            normal_ceiling: None,
        }
    }

    fn bipolar_scalar(sensor_type: SensorType, s: BipolarScalar) -> Self {
        let band = Band::around(s.nominal, s.normal_half);
        Self {
            sensor_type,
            scope:          StateScope::Zone,
            resolution:     Resolution::Continuous,
            channels:       vec![ChannelParams {
                label:             "val",
                nominal:           s.nominal,
                normal_half_range: s.normal_half,
                out_half_range:    s.out_half,
                walk_band:         band,
                recover_band:      band,
                hard_band:         s.hard,
                walk_delta:        s.walk_delta,
                noise_amplitude:   s.noise,
            }],
            excursion_prob: s.excursion_prob,
            bias_prob:      s.bias_prob,
            recover_prob:   0.8,
            excursion:      ExcursionShape::Bipolar,
            spike_profile:  SpikeProfile::Eased,
            spike_duration: SPIKE_DURATION,
            has_hold_phase: true,
            hold_duration:  HOLD_DURATION,
            recovery:       RecoveryRule::Drift { step_min: s.step.0, step_max: s.step.1 },
            display_step:   Some(0.25),
            normal_ceiling: None,
        }
    }

    /// Reject parameter sets the engine cannot run.  Called by the engine
    /// constructor so a bad record fails before the first tick.
    pub fn validate(&self) -> CoreResult<()> {
        let fail = |reason: String| {
            Err(CoreError::InvalidParams { sensor_type: self.sensor_type, reason })
        };

        if self.channels.is_empty() {
            return fail("at least one channel is required".into());
        }
        let expected = if self.sensor_type.is_multi_channel() { 3 } else { 1 };
        if self.channels.len() != expected {
            return fail(format!(
                "{} channels configured, {} expected",
                self.channels.len(),
                expected
            ));
        }
        for (name, p) in [
            ("excursion_prob", self.excursion_prob),
            ("bias_prob", self.bias_prob),
            ("recover_prob", self.recover_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return fail(format!("{name} {p} is outside [0, 1]"));
            }
        }
        if self.spike_duration == 0 {
            return fail("spike_duration must be at least 1 tick".into());
        }
        if self.has_hold_phase && self.hold_duration == 0 {
            return fail("hold_duration must be at least 1 tick when the hold phase is enabled".into());
        }
        if let Some(step) = self.display_step {
            if !(step.is_finite() && step > 0.0) {
                return fail(format!("display_step {step} must be positive"));
            }
        }

        for c in &self.channels {
            if !(c.walk_band.is_ordered() && c.recover_band.is_ordered() && c.hard_band.is_ordered()) {
                return fail(format!("channel {} has an inverted or non-finite band", c.label));
            }
            if !c.walk_band.within(&c.recover_band) || !c.recover_band.within(&c.hard_band) {
                return fail(format!(
                    "channel {} bands must nest as walk ⊆ recover ⊆ hard",
                    c.label
                ));
            }
            if !c.walk_band.contains(c.nominal) {
                return fail(format!("channel {} nominal {} is outside its walk band", c.label, c.nominal));
            }
            if c.walk_delta < 0.0 || c.noise_amplitude < 0.0 || c.out_half_range < 0.0 {
                return fail(format!("channel {} has a negative magnitude", c.label));
            }
        }

        let ordered = |(lo, hi): (f64, f64)| lo <= hi;
        let recovery_ok = match self.recovery {
            RecoveryRule::Drift { step_min, step_max } => step_min > 0.0 && step_min <= step_max,
            RecoveryRule::Jump { toward, away } => ordered(toward) && ordered(away) && toward.0 < 0.0,
            RecoveryRule::Settle { descend, linger, ascend } => {
                ordered(descend) && ordered(linger) && ordered(ascend) && descend.0 > 0.0 && ascend.0 > 0.0
            }
        };
        if !recovery_ok {
            return fail(format!("recovery rule {:?} cannot make progress", self.recovery));
        }
        Ok(())
    }
}

/// Constructor arguments shared by the zone-scoped scalar presets.
struct BipolarScalar {
    nominal:        f64,
    normal_half:    f64,
    out_half:       f64,
    hard:           Band,
    walk_delta:     f64,
    noise:          f64,
    excursion_prob: f64,
    bias_prob:      f64,
    step:           (f64, f64),
}
