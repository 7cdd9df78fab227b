//! Termination requests against a `ProcessSource`.

use serde::{Deserialize, Serialize};

use super::source::ProcessSource;
use crate::error::MonitorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationFailure {
    pub pid: u32,
    pub reason: String,
}

/// Outcome of one termination request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<TerminationFailure>,
}

impl TerminationReport {
    /// Every pid counted as failed for the same reason (timeout, engine gone)
    pub fn all_failed(pids: &[u32], reason: &str) -> Self {
        Self {
            succeeded: 0,
            failed: pids.len(),
            failures: pids
                .iter()
                .map(|&pid| TerminationFailure {
                    pid,
                    reason: reason.to_string(),
                })
                .collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record_failure(&mut self, pid: u32, reason: String) {
        self.failed += 1;
        self.failures.push(TerminationFailure { pid, reason });
    }
}

/// Send a termination request to each pid and count the outcomes.
/// pid 0 is never signalled.
pub fn terminate_all<S: ProcessSource + ?Sized>(source: &mut S, pids: &[u32]) -> TerminationReport {
    let mut report = TerminationReport::default();

    for &pid in pids {
        if pid == 0 {
            let refused = MonitorError::Termination("refusing to signal pid 0".to_string());
            report.record_failure(pid, refused.to_string());
            continue;
        }

        match source.terminate(pid) {
            Ok(()) => {
                log::info!("Sent termination request to pid {}", pid);
                report.succeeded += 1;
            }
            Err(e) => {
                log::warn!("Failed to terminate pid {}: {}", pid, e);
                let reason = match e {
                    MonitorError::ProcessNotFound(_) => "no such process".to_string(),
                    MonitorError::AccessDenied(_) => "access denied".to_string(),
                    other => other.to_string(),
                };
                report.record_failure(pid, reason);
            }
        }
    }

    report
}
