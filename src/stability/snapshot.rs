use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::config::ProbePolicy;
use super::state::CircuitState;

/// Point-in-time view of a breaker for dashboards and reports
///
/// Counter fields are read one at a time, so a snapshot taken while calls are
/// in flight may mix values from either side of a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    /// Number of state transitions so far; changes whenever `state` does
    pub generation: u64,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub retry_delay: Duration,
    pub probe_window_size: u32,
    pub probe_successes: u32,
    pub probe_failures: u32,
    pub probe_failure_percent_threshold: u32,
    pub probe_policy: ProbePolicy,
    pub timeout_hint: Option<Duration>,
}

impl BreakerSnapshot {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("State", self.state.to_string())];
        if let Some(timeout) = self.timeout_hint {
            rows.push(("Timeout", format!("{:?}", timeout)));
        }
        rows.push((
            "Failure (current/threshold)",
            format!("{} / {}", self.failure_count, self.failure_threshold),
        ));
        rows.push(("Retry Delay", format!("{:?}", self.retry_delay)));
        match self.probe_policy {
            ProbePolicy::FailurePercent => {
                rows.push(("Half-Open probe window", self.probe_window_size.to_string()));
            }
            ProbePolicy::ConsecutiveSuccesses { threshold } => {
                rows.push(("Half-Open successes to close", threshold.to_string()));
            }
        }
        rows.push(("Half-Open success count", self.probe_successes.to_string()));
        rows.push(("Half-Open failure count", self.probe_failures.to_string()));
        rows.push((
            "Half-Open fail % threshold",
            format!("{}%", self.probe_failure_percent_threshold),
        ));
        rows
    }
}

impl fmt::Display for BreakerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = ("Circuit Breaker", self.name.clone());
        let rows = self.rows();

        let left = rows
            .iter()
            .map(|(label, _)| label.len())
            .chain(std::iter::once(header.0.len()))
            .max()
            .unwrap_or(0);
        let right = rows
            .iter()
            .map(|(_, value)| value.len())
            .chain(std::iter::once(header.1.len()))
            .max()
            .unwrap_or(0);

        let rule = format!("+-{}-+-{}-+", "-".repeat(left), "-".repeat(right));
        writeln!(f, "{}", rule)?;
        writeln!(f, "| {:<left$} | {:<right$} |", header.0, header.1)?;
        writeln!(f, "{}", rule)?;
        for (label, value) in &rows {
            writeln!(f, "| {:<left$} | {:<right$} |", label, value)?;
        }
        write!(f, "{}", rule)
    }
}
