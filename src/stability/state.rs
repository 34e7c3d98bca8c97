use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,    // Normal operation
    Open,      // Failing, reject requests
    #[serde(rename = "Half-Open")]
    HalfOpen,  // Testing if service recovered
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "Half-Open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct StateCell {
    state: CircuitState,
    /// Bumped on every transition; timers and in-flight probes compare against it.
    epoch: u64,
}

/// Shared-read / exclusive-write home of the breaker state.
///
/// Every transition is a single write under the lock, so readers never see a
/// half-applied change. Counters live elsewhere and are not covered by it.
#[derive(Debug)]
pub struct StateStore {
    cell: RwLock<StateCell>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            cell: RwLock::new(StateCell {
                state: CircuitState::Closed,
                epoch: 0,
            }),
        }
    }

    pub fn get(&self) -> CircuitState {
        self.cell
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .state
    }

    pub fn epoch(&self) -> u64 {
        self.cell
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .epoch
    }

    /// State and epoch read together under one lock acquisition
    pub fn observe(&self) -> (CircuitState, u64) {
        let cell = self.cell.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        (cell.state, cell.epoch)
    }

    /// Unconditional write. Returns the epoch in effect after the write.
    pub fn set(&self, state: CircuitState) -> u64 {
        let mut cell = self.cell.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self::apply(&mut cell, state)
    }

    /// Compare-and-set: only moves to `to` while the current state is `from`.
    ///
    /// Returns the new epoch on success, `None` if another caller got there first.
    pub fn transition(&self, from: CircuitState, to: CircuitState) -> Option<u64> {
        let mut cell = self.cell.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cell.state != from {
            return None;
        }
        Some(Self::apply(&mut cell, to))
    }

    /// Compare-and-set against both state and epoch.
    ///
    /// `on_enter` runs under the write lock, before the new state is visible.
    pub fn transition_at<F: FnOnce()>(
        &self,
        from: CircuitState,
        epoch: u64,
        to: CircuitState,
        on_enter: F,
    ) -> Option<u64> {
        let mut cell = self.cell.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cell.state != from || cell.epoch != epoch {
            return None;
        }
        on_enter();
        Some(Self::apply(&mut cell, to))
    }

    /// Open -> HalfOpen, but only for the Open period identified by `epoch`.
    ///
    /// `on_enter` runs while the write lock is still held.
    pub fn half_open_if_current<F: FnOnce()>(&self, epoch: u64, on_enter: F) -> bool {
        let mut cell = self.cell.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cell.epoch != epoch || cell.state != CircuitState::Open {
            return false;
        }
        on_enter();
        Self::apply(&mut cell, CircuitState::HalfOpen);
        true
    }

    /// Run `f` under the read lock if the breaker is still in `state` at `epoch`.
    ///
    /// No transition can land while `f` runs.
    pub fn while_current<R, F: FnOnce() -> R>(
        &self,
        state: CircuitState,
        epoch: u64,
        f: F,
    ) -> Option<R> {
        let cell = self.cell.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        if cell.state != state || cell.epoch != epoch {
            return None;
        }
        Some(f())
    }

    fn apply(cell: &mut StateCell, state: CircuitState) -> u64 {
        cell.epoch = cell.epoch.wrapping_add(1);
        cell.state = state;
        cell.epoch
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed() {
        let store = StateStore::new();
        assert_eq!(store.get(), CircuitState::Closed);
        assert_eq!(store.epoch(), 0);
    }

    #[test]
    fn test_entering_open_bumps_epoch() {
        let store = StateStore::new();
        let first = store.set(CircuitState::Open);
        assert_eq!(first, 1);

        store.set(CircuitState::HalfOpen);
        let second = store.set(CircuitState::Open);
        assert!(second > first);
    }

    #[test]
    fn test_transition_is_compare_and_set() {
        let store = StateStore::new();
        assert!(store.transition(CircuitState::Closed, CircuitState::Open).is_some());
        assert!(store.transition(CircuitState::Closed, CircuitState::Open).is_none());
        assert_eq!(store.get(), CircuitState::Open);
    }

    #[test]
    fn test_stale_epoch_does_not_half_open() {
        let store = StateStore::new();
        let stale = store.set(CircuitState::Open);
        store.set(CircuitState::HalfOpen);
        let current = store.set(CircuitState::Open);

        assert!(!store.half_open_if_current(stale, || {}));
        assert_eq!(store.get(), CircuitState::Open);

        assert!(store.half_open_if_current(current, || {}));
        assert_eq!(store.get(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_leaving_open_retires_timer() {
        let store = StateStore::new();
        let epoch = store.set(CircuitState::Open);
        store.set(CircuitState::Closed);
        store.set(CircuitState::Open);
        // Still Open, but from a newer period
        assert!(!store.half_open_if_current(epoch, || {}));
    }

    #[test]
    fn test_half_open_entry_bumps_epoch() {
        let store = StateStore::new();
        let open = store.set(CircuitState::Open);
        assert!(store.half_open_if_current(open, || {}));

        let (state, epoch) = store.observe();
        assert_eq!(state, CircuitState::HalfOpen);
        assert!(epoch > open);
    }

    #[test]
    fn test_transition_at_rejects_old_epoch() {
        let store = StateStore::new();
        let open = store.set(CircuitState::Open);
        assert!(store.half_open_if_current(open, || {}));
        let (_, half_open) = store.observe();

        let mut ran = false;
        assert!(store
            .transition_at(CircuitState::HalfOpen, open, CircuitState::Closed, || ran = true)
            .is_none());
        assert!(!ran);

        assert!(store
            .transition_at(CircuitState::HalfOpen, half_open, CircuitState::Closed, || ran = true)
            .is_some());
        assert!(ran);
        assert_eq!(store.get(), CircuitState::Closed);
    }

    #[test]
    fn test_while_current_only_runs_for_matching_epoch() {
        let store = StateStore::new();
        let open = store.set(CircuitState::Open);
        assert_eq!(store.while_current(CircuitState::Open, open, || 7), Some(7));

        store.set(CircuitState::Open);
        assert_eq!(store.while_current(CircuitState::Open, open, || 7), None);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(serde_json::to_string(&CircuitState::HalfOpen).unwrap(), "\"Half-Open\"");
        assert_eq!(CircuitState::HalfOpen.to_string(), "Half-Open");
        assert_eq!(CircuitState::Closed.as_str(), "Closed");
    }
}
