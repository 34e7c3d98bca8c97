use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::defaults::{
    DEFAULT_FAILURE_THRESHOLD, DEFAULT_PROBE_FAILURE_PERCENT_THRESHOLD,
    DEFAULT_PROBE_WINDOW_SIZE, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT_HINT, MAX_PERCENT,
};

/// How a Half-Open breaker decides between closing and reopening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProbePolicy {
    /// Collect a fixed window of probes, reopen if the failure share is too high
    #[default]
    FailurePercent,
    /// Close after `threshold` successes in a row, reopen on the first failure
    ConsecutiveSuccesses { threshold: u32 },
}

/// Circuit breaker configuration.
///
/// Zero means "unset" for every numeric field; `resolve` fills in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub retry_delay: Duration,
    pub probe_window_size: u32,
    pub probe_failure_percent_threshold: u32,
    pub timeout_hint: Duration,
    pub probe_policy: ProbePolicy,
}

/// Configuration after normalization; every field is inside its domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub failure_threshold: u32,
    pub retry_delay: Duration,
    pub probe_window_size: u32,
    pub probe_failure_percent_threshold: u32,
    pub timeout_hint: Duration,
    pub probe_policy: ProbePolicy,
}

impl BreakerConfig {
    /// Replace unset or out-of-domain values with defaults. Never fails.
    pub fn resolve(&self) -> ResolvedConfig {
        let failure_threshold = if self.failure_threshold == 0 {
            DEFAULT_FAILURE_THRESHOLD
        } else {
            self.failure_threshold
        };

        let retry_delay = if self.retry_delay.is_zero() {
            DEFAULT_RETRY_DELAY
        } else {
            self.retry_delay
        };

        let probe_window_size = if self.probe_window_size == 0 {
            DEFAULT_PROBE_WINDOW_SIZE
        } else {
            self.probe_window_size
        };

        let probe_failure_percent_threshold = match self.probe_failure_percent_threshold {
            0 => DEFAULT_PROBE_FAILURE_PERCENT_THRESHOLD,
            p if p > MAX_PERCENT => DEFAULT_PROBE_FAILURE_PERCENT_THRESHOLD,
            p => p,
        };

        let probe_policy = match self.probe_policy {
            ProbePolicy::ConsecutiveSuccesses { threshold: 0 } => {
                ProbePolicy::ConsecutiveSuccesses { threshold: probe_window_size }
            }
            other => other,
        };

        ResolvedConfig {
            failure_threshold,
            retry_delay,
            probe_window_size,
            probe_failure_percent_threshold,
            timeout_hint: if self.timeout_hint.is_zero() {
                DEFAULT_TIMEOUT_HINT
            } else {
                self.timeout_hint
            },
            probe_policy,
        }
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        BreakerConfig::default().resolve()
    }
}
