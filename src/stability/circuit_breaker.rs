use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::{BreakerConfig, ResolvedConfig};
use super::counters::{CounterBank, ProbeVerdict};
use super::errors::BreakerError;
use super::scheduler::RetryScheduler;
use super::snapshot::BreakerSnapshot;
use super::state::{CircuitState, StateStore};
use crate::config::defaults::DEFAULT_BREAKER_NAME;

/// Circuit breaker guarding calls that produce a `T`
///
/// Calls run outside every breaker lock, so a slow dependency never blocks
/// other callers from reading or changing the state.
pub struct Breaker<T> {
    name: Arc<str>,
    state: Arc<StateStore>,
    counters: Arc<CounterBank>,
    scheduler: RetryScheduler,
    config: ResolvedConfig,
    _result: PhantomData<fn() -> T>,
}

impl<T> Breaker<T> {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name = DEFAULT_BREAKER_NAME.to_string();
        }
        let name: Arc<str> = Arc::from(name);
        let config = config.resolve();
        let state = Arc::new(StateStore::new());
        let counters = Arc::new(CounterBank::new(&config));
        let scheduler = RetryScheduler::new(
            Arc::clone(&name),
            config.retry_delay,
            Arc::clone(&state),
            Arc::clone(&counters),
        );

        Self {
            name,
            state,
            counters,
            scheduler,
            config,
            _result: PhantomData,
        }
    }

    /// Execute a function with circuit breaker protection
    pub fn execute<F, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let (state, epoch) = self.state.observe();
        if state == CircuitState::Open {
            return Err(self.open_error());
        }

        let result = work();
        self.record(state, epoch, result.is_ok());
        result.map_err(BreakerError::Failed)
    }

    /// Async flavour of [`Breaker::execute`]; no lock is held across the await
    pub async fn execute_async<F, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let (state, epoch) = self.state.observe();
        if state == CircuitState::Open {
            return Err(self.open_error());
        }

        let result = work.await;
        self.record(state, epoch, result.is_ok());
        result.map_err(BreakerError::Failed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.state.get()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Advisory call deadline; stored for reporting, never enforced here
    pub fn timeout_hint(&self) -> Option<Duration> {
        if self.config.timeout_hint.is_zero() {
            None
        } else {
            Some(self.config.timeout_hint)
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let (state, generation) = self.state.observe();
        BreakerSnapshot {
            name: self.name.to_string(),
            state,
            generation,
            failure_count: self.counters.failure_count(),
            failure_threshold: self.counters.failure_threshold(),
            retry_delay: self.scheduler.delay(),
            probe_window_size: self.counters.probe_window_size(),
            probe_successes: self.counters.probe_successes(),
            probe_failures: self.counters.probe_failures(),
            probe_failure_percent_threshold: self.counters.probe_failure_percent_threshold(),
            probe_policy: self.config.probe_policy,
            timeout_hint: self.timeout_hint(),
        }
    }

    /// Force the breaker closed and clear every counter
    pub fn reset(&self) {
        self.state.set(CircuitState::Closed);
        self.counters.reset_failures();
        self.counters.reset_probes();
        debug!(breaker = %self.name, "Circuit breaker has been reset");
    }

    /// Force the breaker open and start a fresh retry period
    pub fn trip(&self) {
        let epoch = self.state.set(CircuitState::Open);
        warn!(breaker = %self.name, "Circuit breaker forced OPEN");
        self.scheduler.arm(epoch);
    }

    fn open_error<E>(&self) -> BreakerError<E> {
        BreakerError::Open {
            name: self.name.to_string(),
        }
    }

    fn record(&self, observed: CircuitState, epoch: u64, success: bool) {
        match observed {
            CircuitState::Closed if !success => self.record_closed_failure(),
            CircuitState::Closed => {}
            CircuitState::HalfOpen => self.record_probe_outcome(epoch, success),
            CircuitState::Open => {}
        }
    }

    fn record_closed_failure(&self) {
        if !self.counters.record_closed_failure() {
            return;
        }
        // Only the caller that wins the transition arms the timer
        if let Some(epoch) = self.state.transition(CircuitState::Closed, CircuitState::Open) {
            warn!(
                breaker = %self.name,
                failures = self.counters.failure_count(),
                "Circuit breaker transitioned to OPEN"
            );
            self.scheduler.arm(epoch);
        }
    }

    /// Count a probe started at `epoch`; outcomes from an earlier window are dropped
    fn record_probe_outcome(&self, epoch: u64, success: bool) {
        let counters = &self.counters;
        let verdict = match self.state.while_current(CircuitState::HalfOpen, epoch, || {
            counters.record_probe(success)
        }) {
            Some(verdict) => verdict,
            None => {
                debug!(breaker = %self.name, success, "Late probe outcome discarded");
                return;
            }
        };

        match verdict {
            ProbeVerdict::Pending | ProbeVerdict::Discarded => {}
            ProbeVerdict::Reopen => {
                let failures = counters.probe_failures();
                if let Some(next) = self.state.transition_at(
                    CircuitState::HalfOpen,
                    epoch,
                    CircuitState::Open,
                    || counters.reset_probes(),
                ) {
                    warn!(
                        breaker = %self.name,
                        probe_failures = failures,
                        "Circuit breaker transitioned back to OPEN from HALF-OPEN"
                    );
                    self.scheduler.arm(next);
                }
            }
            ProbeVerdict::Close => {
                let closed = self.state.transition_at(
                    CircuitState::HalfOpen,
                    epoch,
                    CircuitState::Closed,
                    || {
                        counters.reset_failures();
                        counters.reset_probes();
                    },
                );
                if closed.is_some() {
                    info!(breaker = %self.name, "Circuit breaker transitioned to CLOSED");
                }
            }
        }
    }
}

impl<T> std::fmt::Debug for Breaker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("config", &self.config)
            .finish()
    }
}
