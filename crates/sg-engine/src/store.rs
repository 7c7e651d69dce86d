//! The `StateStore` — every scope's state, owned by exactly one Driver.

use std::sync::Arc;

use sg_core::{ScopeIdx, SensorGroup, SensorParams, SimRng};

use crate::ScopeState;

/// Maps scope indices (and their zone / sensor ids) to state records.
///
/// `states` and `keys` are parallel vectors indexed by [`ScopeIdx`].
#[derive(Clone, Debug)]
pub struct StateStore {
    pub states: Vec<ScopeState>,
    pub keys:   Vec<Arc<str>>,
}

impl StateStore {
    /// One randomized NORMAL state per scope of `group`.
    pub fn for_group(group: &SensorGroup, params: &SensorParams, rng: &mut SimRng) -> Self {
        let states = (0..group.scope_count())
            .map(|_| ScopeState::randomized(params, rng))
            .collect();
        Self {
            states,
            keys: group.scope_keys.clone(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn get(&self, scope: ScopeIdx) -> &ScopeState {
        &self.states[scope.index()]
    }

    /// Look a state up by its zone or sensor id.
    pub fn by_key(&self, key: &str) -> Option<&ScopeState> {
        self.keys
            .iter()
            .position(|k| &**k == key)
            .map(|i| &self.states[i])
    }
}
