//! Process table construction: normalize, filter, sort and truncate.

use super::metrics::{ProcessRecord, ProcessTable};
use super::source::{ProbeError, ProcessProbe, ProcessSource, RawProcess};
use crate::error::Result;

pub const DEFAULT_PROCESS_LIMIT: usize = 200;
pub const UNKNOWN_USER: &str = "unknown";

/// Spread a raw per-process CPU% over all logical cores so it lands on the
/// same 0-100 scale as the aggregate system CPU%.
pub fn normalize_cpu(raw_percent: f32, logical_cores: usize) -> f32 {
    raw_percent / logical_cores.max(1) as f32
}

/// Build a full-replacement table from one enumeration pass.
pub fn build_process_table(
    probes: Vec<ProcessProbe>,
    logical_cores: usize,
    limit: usize,
) -> ProcessTable {
    let mut processes: Vec<ProcessRecord> = probes
        .into_iter()
        .filter_map(|probe| match probe {
            Ok(raw) => Some(raw),
            Err(ProbeError::Vanished) => {
                log::debug!("Skipping process that exited during scan");
                None
            }
            Err(ProbeError::AccessDenied) => {
                log::debug!("Skipping process without read access");
                None
            }
        })
        .filter(|raw| raw.pid != 0)
        .map(|raw| to_record(raw, logical_cores))
        .collect();

    let total_seen = processes.len();

    // Stable sort keeps enumeration order among equal CPU values
    processes.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    processes.truncate(limit);

    ProcessTable {
        processes,
        total_seen,
        timestamp: chrono::Utc::now().timestamp_millis(),
    }
}

/// Enumerate `source` and build the table in one step.
pub fn scan<S: ProcessSource + ?Sized>(source: &mut S, limit: usize) -> Result<ProcessTable> {
    let probes = source.processes()?;
    Ok(build_process_table(probes, source.logical_cores(), limit))
}

fn to_record(raw: RawProcess, logical_cores: usize) -> ProcessRecord {
    let cpu_percent = if raw.cpu_percent.is_finite() {
        normalize_cpu(raw.cpu_percent.max(0.0), logical_cores)
    } else {
        0.0
    };

    ProcessRecord {
        pid: raw.pid,
        name: raw.name,
        cpu_percent,
        memory_percent: raw.memory_percent,
        memory_mb: raw.memory_bytes as f64 / (1024.0 * 1024.0),
        threads: raw.threads,
        status: raw.status,
        user: raw.user.unwrap_or_else(|| UNKNOWN_USER.to_string()),
    }
}
