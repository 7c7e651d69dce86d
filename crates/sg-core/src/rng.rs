//! Deterministic simulation RNG.
//!
//! # Determinism strategy
//!
//! Each Driver owns one `SimRng`, seeded by:
//!
//!   seed = global_seed XOR (stream * MIXING_CONSTANT)
//!
//! where `stream` is the sensor type's ordinal.  The mixing constant is the
//! 64-bit fractional part of the golden ratio, which spreads consecutive
//! stream numbers across the seed space.  Drivers therefore never share RNG
//! state, and a fixed global seed reproduces every sensor type's series
//! regardless of thread scheduling.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::SensorType;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-Driver deterministic RNG.
///
/// Not `Sync` on purpose: one instance per Driver thread.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Seed from OS entropy.  Used when no `--seed` is configured.
    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// Seed the stream for `sensor_type` from the run's global seed.
    pub fn for_sensor_type(global_seed: u64, sensor_type: SensorType) -> Self {
        let stream = sensor_type.ordinal() as u64 + 1;
        SimRng::new(global_seed ^ stream.wrapping_mul(MIXING_CONSTANT))
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform in `[lo, hi)`; returns `lo` when the range is empty.
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + self.unit() * (hi - lo)
    }

    /// Uniform in `[-amplitude, amplitude)`.
    #[inline]
    pub fn symmetric(&mut self, amplitude: f64) -> f64 {
        (self.unit() * 2.0 - 1.0) * amplitude
    }

    /// Uniform integer in the closed range `[lo, hi]`, returned as `f64`.
    ///
    /// Bounds are rounded to the nearest integer first; an inverted range
    /// yields `lo`.
    #[inline]
    pub fn int_inclusive(&mut self, lo: f64, hi: f64) -> f64 {
        let (lo, hi) = (lo.round() as i64, hi.round() as i64);
        if hi <= lo {
            return lo as f64;
        }
        self.0.gen_range(lo..=hi) as f64
    }
}
