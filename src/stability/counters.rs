use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use super::config::{ProbePolicy, ResolvedConfig};

/// What a recorded probe outcome means for the Half-Open window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// Window still filling
    Pending,
    /// Probing succeeded; close the breaker
    Close,
    /// Probing failed; reopen and wait again
    Reopen,
    /// Window already full, outcome belongs to no window
    Discarded,
}

const SUCCESS_MASK: u64 = 0xFFFF_FFFF;

fn pack(failures: u32, successes: u32) -> u64 {
    (u64::from(failures) << 32) | u64::from(successes)
}

fn unpack(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, (word & SUCCESS_MASK) as u32)
}

/// Lock-free bookkeeping for one breaker.
///
/// The two probe tallies share one atomic word so a window can only be
/// completed once; `failure_count` is independent.
#[derive(Debug)]
pub struct CounterBank {
    failure_count: AtomicU32,
    probes: AtomicU64,
    failure_threshold: u32,
    probe_window_size: u32,
    probe_failure_percent_threshold: u32,
    probe_policy: ProbePolicy,
}

impl CounterBank {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            probes: AtomicU64::new(0),
            failure_threshold: config.failure_threshold,
            probe_window_size: config.probe_window_size,
            probe_failure_percent_threshold: config.probe_failure_percent_threshold,
            probe_policy: config.probe_policy,
        }
    }

    /// Count one Closed-state failure. Returns true once the threshold is reached.
    pub fn record_closed_failure(&self) -> bool {
        let failures = self.failure_count.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        failures >= self.failure_threshold
    }

    /// Tally one probe outcome and report whether the window has been decided.
    pub fn record_probe(&self, success: bool) -> ProbeVerdict {
        match self.probe_policy {
            ProbePolicy::FailurePercent => self.record_windowed_probe(success),
            ProbePolicy::ConsecutiveSuccesses { threshold } => {
                self.record_consecutive_probe(success, threshold)
            }
        }
    }

    fn record_windowed_probe(&self, success: bool) -> ProbeVerdict {
        let window = self.probe_window_size;
        let updated = self
            .probes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (failures, successes) = unpack(word);
                if failures + successes >= window {
                    return None;
                }
                Some(if success {
                    pack(failures, successes + 1)
                } else {
                    pack(failures + 1, successes)
                })
            });

        let previous = match updated {
            Ok(previous) => previous,
            Err(_) => return ProbeVerdict::Discarded,
        };

        let (mut failures, mut successes) = unpack(previous);
        if success {
            successes += 1;
        } else {
            failures += 1;
        }
        if failures + successes < window {
            return ProbeVerdict::Pending;
        }

        let failure_percent = u64::from(failures) * 100 / u64::from(window);
        if failure_percent >= u64::from(self.probe_failure_percent_threshold) {
            ProbeVerdict::Reopen
        } else {
            ProbeVerdict::Close
        }
    }

    fn record_consecutive_probe(&self, success: bool, threshold: u32) -> ProbeVerdict {
        if !success {
            self.probes.fetch_add(pack(1, 0), Ordering::AcqRel);
            return ProbeVerdict::Reopen;
        }
        let previous = self.probes.fetch_add(1, Ordering::AcqRel);
        let (_, successes) = unpack(previous);
        if successes + 1 >= threshold {
            ProbeVerdict::Close
        } else {
            ProbeVerdict::Pending
        }
    }

    pub fn reset_probes(&self) {
        self.probes.store(0, Ordering::Release);
    }

    pub fn reset_failures(&self) {
        self.failure_count.store(0, Ordering::Release);
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    pub fn probe_failures(&self) -> u32 {
        unpack(self.probes.load(Ordering::Acquire)).0
    }

    pub fn probe_successes(&self) -> u32 {
        unpack(self.probes.load(Ordering::Acquire)).1
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn probe_window_size(&self) -> u32 {
        self.probe_window_size
    }

    pub fn probe_failure_percent_threshold(&self) -> u32 {
        self.probe_failure_percent_threshold
    }
}
