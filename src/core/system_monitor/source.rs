//! Inbound interfaces to the OS metrics provider.
//!
//! The sampler and the process table builder only depend on these traits.
//! `SysinfoCollector` implements them for real hosts; tests plug in fakes.

use crate::error::Result;

use super::metrics::{PowerStatus, ProcessDetails, SystemInfo, TemperatureReading};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuReading {
    pub global_usage: f64,
    pub per_core_usage: Vec<f64>,
    pub frequency_mhz: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

impl MemoryReading {
    pub fn usage_percent(&self) -> f64 {
        percent_of(self.used_bytes, self.total_bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskSpaceReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskSpaceReading {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    pub fn usage_percent(&self) -> f64 {
        percent_of(self.used_bytes(), self.total_bytes)
    }
}

/// Cumulative byte counters since boot (or since the device appeared)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    /// Bytes sent (network) or written (disk)
    pub outbound_bytes: u64,
    /// Bytes received (network) or read (disk)
    pub inbound_bytes: u64,
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Point-in-time gauges and cumulative counters.
///
/// Every read is independently fallible; a failure only affects that value
/// for the current tick.
pub trait CounterSource: Send {
    /// Called once at the start of each tick before any read
    fn refresh(&mut self) {}

    fn cpu(&mut self) -> Result<CpuReading>;

    fn memory(&mut self) -> Result<MemoryReading>;

    fn disk_space(&mut self, mount_point: &str) -> Result<DiskSpaceReading>;

    fn disk_io(&mut self) -> Result<IoCounters>;

    fn network_io(&mut self) -> Result<IoCounters>;

    /// `Ok(None)` when the host has no battery
    fn power(&mut self) -> Result<Option<PowerStatus>>;

    /// May be empty on platforms without sensor support
    fn temperatures(&mut self) -> Result<Vec<TemperatureReading>>;

    fn logical_cores(&self) -> usize;
}

/// Raw per-process values as reported by the OS, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawProcess {
    pub pid: u32,
    pub name: String,
    /// Per-process CPU%, may exceed 100 on multi-core hosts
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_bytes: u64,
    pub threads: usize,
    pub status: String,
    pub user: Option<String>,
}

/// Expected per-process failures during enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    /// The process exited between enumeration and the detail read
    Vanished,
    AccessDenied,
}

pub type ProcessProbe = std::result::Result<RawProcess, ProbeError>;

pub trait ProcessSource: Send {
    fn processes(&mut self) -> Result<Vec<ProcessProbe>>;

    fn logical_cores(&self) -> usize;

    fn process_details(&mut self, pid: u32) -> Result<ProcessDetails>;

    /// Ask the OS to terminate `pid`. `Ok(())` once the signal was delivered.
    fn terminate(&mut self, pid: u32) -> Result<()>;
}

pub trait SystemInfoSource: Send {
    fn system_info(&mut self, disk_mount: &str) -> Result<SystemInfo>;
}

/// Everything the background job worker reads from
pub trait HostSource: ProcessSource + SystemInfoSource {}

impl<T: ProcessSource + SystemInfoSource> HostSource for T {}
