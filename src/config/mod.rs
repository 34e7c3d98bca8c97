pub mod defaults;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::stability::{BreakerConfig, ProbePolicy};
use defaults::{DEFAULT_LOG_LEVEL, DEFAULT_TICK_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub tick_ms: u64,
    pub breakers: Vec<BreakerSettings>,
}

/// File form of a breaker's configuration. Durations are in milliseconds and
/// zero means "use the default", same as in `BreakerConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub name: String,
    pub failure_threshold: u32,
    pub retry_delay_ms: u64,
    pub probe_window_size: u32,
    pub probe_failure_percent_threshold: u32,
    pub timeout_hint_ms: u64,
    pub probe_policy: ProbePolicy,
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = config_path {
            // Load from file
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            // Use defaults
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Structural checks only; numeric breaker fields are normalized, never rejected
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for breaker in &self.breakers {
            if breaker.name.trim().is_empty() {
                return Err(anyhow::anyhow!("Breaker name must not be empty"));
            }
            if !seen.insert(breaker.name.as_str()) {
                return Err(anyhow::anyhow!("Duplicate breaker name: {}", breaker.name));
            }
        }

        if self.tick_ms == 0 {
            return Err(anyhow::anyhow!("Tick interval must be greater than 0"));
        }

        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            tick_ms: DEFAULT_TICK_MS,
            breakers: vec![BreakerSettings {
                name: "accounts".to_string(),
                ..Default::default()
            }],
        }
    }
}

impl From<&BreakerSettings> for BreakerConfig {
    fn from(settings: &BreakerSettings) -> Self {
        BreakerConfig {
            failure_threshold: settings.failure_threshold,
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            probe_window_size: settings.probe_window_size,
            probe_failure_percent_threshold: settings.probe_failure_percent_threshold,
            timeout_hint: Duration::from_millis(settings.timeout_hint_ms),
            probe_policy: settings.probe_policy,
        }
    }
}
