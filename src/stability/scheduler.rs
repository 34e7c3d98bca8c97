use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::counters::CounterBank;
use super::state::StateStore;

/// Fire-and-forget Open -> HalfOpen timer
///
/// Every timer sleeps on its own detached thread, so it fires whatever the
/// caller's runtime does afterwards. Timers are never cancelled. Each one
/// carries the epoch of the Open period that armed it and does nothing if that
/// period has ended by the time it fires.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    name: Arc<str>,
    delay: Duration,
    state: Arc<StateStore>,
    counters: Arc<CounterBank>,
}

impl RetryScheduler {
    pub fn new(
        name: Arc<str>,
        delay: Duration,
        state: Arc<StateStore>,
        counters: Arc<CounterBank>,
    ) -> Self {
        Self {
            name,
            delay,
            state,
            counters,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule the HalfOpen transition for the Open period `epoch`.
    pub fn arm(&self, epoch: u64) {
        let scheduler = self.clone();
        debug!(breaker = %self.name, epoch, delay = ?self.delay, "Retry timer armed");

        let spawned = thread::Builder::new()
            .name(format!("sparkgap-retry-{}", self.name))
            .spawn(move || {
                thread::sleep(scheduler.delay);
                scheduler.fire(epoch);
            });
        if let Err(e) = spawned {
            // Without a timer thread the breaker would stay Open forever
            warn!(breaker = %self.name, error = %e, "Failed to spawn retry timer, half-opening now");
            self.fire(epoch);
        }
    }

    fn fire(&self, epoch: u64) -> bool {
        let counters = &self.counters;
        let entered = self
            .state
            .half_open_if_current(epoch, || counters.reset_probes());

        if entered {
            debug!(breaker = %self.name, epoch, "Circuit breaker transitioned to HALF-OPEN");
        } else {
            debug!(breaker = %self.name, epoch, "Stale retry timer ignored");
        }
        entered
    }
}
