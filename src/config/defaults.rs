/// Default configuration constants for sparkgap breakers
use std::time::Duration;

// Trip defaults
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

// Half-open probing defaults
pub const DEFAULT_PROBE_WINDOW_SIZE: u32 = 10;
pub const DEFAULT_PROBE_FAILURE_PERCENT_THRESHOLD: u32 = 30;
pub const MAX_PERCENT: u32 = 100;

// Advisory only, never enforced by the breaker
pub const DEFAULT_TIMEOUT_HINT: Duration = Duration::ZERO;

/// Name given to breakers constructed with an empty name
pub const DEFAULT_BREAKER_NAME: &str = "breaker";

// Demo workload defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_TICK_MS: u64 = 250;
pub const DEFAULT_CONFIG_FILENAME: &str = "sparkgap.toml";
