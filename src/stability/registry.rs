use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::circuit_breaker::Breaker;
use super::config::BreakerConfig;
use super::snapshot::BreakerSnapshot;

/// Circuit breaker registry for managing one breaker per dependency
pub struct BreakerRegistry<T> {
    breakers: Mutex<HashMap<String, Arc<Breaker<T>>>>,
}

impl<T> BreakerRegistry<T> {
    pub fn new() -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
        }
    }

    /// Existing breaker for `name`, or a new one built from `config`.
    ///
    /// `config` is ignored when the breaker already exists.
    pub fn get_or_create(&self, name: &str, config: BreakerConfig) -> Arc<Breaker<T>> {
        let mut breakers = self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(breaker) = breakers.get(name) {
            Arc::clone(breaker)
        } else {
            let breaker = Arc::new(Breaker::new(name, config));
            breakers.insert(name.to_string(), Arc::clone(&breaker));
            breaker
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Breaker<T>>> {
        let breakers = self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        breakers.get(name).cloned()
    }

    /// Snapshots of every breaker, ordered by name
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers = self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut snapshots: Vec<BreakerSnapshot> = breakers.values().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn reset_all(&self) {
        let breakers = self.breakers.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for breaker in breakers.values() {
            breaker.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.breakers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BreakerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
