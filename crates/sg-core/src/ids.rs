//! Strongly typed index wrappers.
//!
//! Sensor and zone *names* are strings (`"temp-001"`, `"a01"`) and live in
//! [`Sensor`][crate::Sensor].  The engine never hashes those strings on the
//! hot path; it works with these dense indices into `Vec`s instead.

use std::fmt;

/// Generate a typed index wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid index".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Position of a sensor inside its [`SensorGroup`][crate::SensorGroup].
    pub struct SensorIdx(u32);
}

typed_id! {
    /// Index of one evolving quantity in the engine's state store.
    ///
    /// A scope is a zone for zone-shared sensor types and a single sensor for
    /// sensor-local ones; see [`StateScope`][crate::StateScope].
    pub struct ScopeIdx(u32);
}
