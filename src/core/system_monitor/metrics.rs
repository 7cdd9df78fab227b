use serde::{Deserialize, Serialize};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub fn bytes_to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Complete point-in-time snapshot published once per tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub tick: u64,
    pub timestamp: i64, // Unix timestamp (ms)
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    pub disk: DiskMetrics,
    pub network: IoRates,
    pub disk_io: IoRates,
    pub power: Option<PowerStatus>,
    pub temperatures: Vec<TemperatureReading>,
    pub process_count: usize,
    pub history: HistorySnapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CpuMetrics {
    pub global_usage: f64,
    pub per_core_usage: Vec<f64>,
    pub frequency_mhz: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryMetrics {
    pub usage_percent: f64,
    pub total_gb: f64,
    pub used_gb: f64,
    pub available_gb: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiskMetrics {
    pub mount_point: String,
    pub usage_percent: f64,
    pub total_gb: f64,
    pub used_gb: f64,
    pub free_gb: f64,
}

/// Pair of byte rates derived from cumulative counters.
///
/// `outbound` is bytes sent (network) or written (disk), `inbound` is bytes
/// received or read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct IoRates {
    pub outbound_bytes_per_sec: f64,
    pub inbound_bytes_per_sec: f64,
}

impl IoRates {
    pub fn total(&self) -> f64 {
        self.outbound_bytes_per_sec + self.inbound_bytes_per_sec
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum BatteryTime {
    Seconds(u64),
    Unlimited,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerStatus {
    pub battery_percent: f32,
    pub plugged_in: bool,
    pub time_remaining: BatteryTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TemperatureReading {
    pub label: String,
    pub current_celsius: f32,
    pub max_celsius: f32,
    pub critical_celsius: Option<f32>,
}

/// Copies of every history buffer at one tick, oldest sample first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub cpu_usage: Vec<f64>,
    pub memory_usage: Vec<f64>,
    pub disk_usage: Vec<f64>,
    pub network_total: Vec<f64>,
    pub network_sent: Vec<f64>,
    pub network_received: Vec<f64>,
    pub disk_read: Vec<f64>,
    pub disk_write: Vec<f64>,
    pub per_core: Vec<Vec<f64>>,
    pub cpu_frequency: Vec<f64>,
    pub temperature: Vec<f64>,
    pub process_count: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    /// Raw CPU% divided by the logical core count (0-100)
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_mb: f64,
    pub threads: usize,
    pub status: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessHighlight {
    HighCpu,
    HighMemory,
    Normal,
}

impl ProcessRecord {
    pub fn highlight(&self) -> ProcessHighlight {
        if self.cpu_percent > 20.0 {
            ProcessHighlight::HighCpu
        } else if self.memory_percent > 10.0 {
            ProcessHighlight::HighMemory
        } else {
            ProcessHighlight::Normal
        }
    }
}

/// Top-N process list, sorted descending by normalized CPU%
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessTable {
    pub processes: Vec<ProcessRecord>,
    /// Processes seen by the scan before truncation
    pub total_seen: usize,
    pub timestamp: i64,
}

impl ProcessTable {
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Case-insensitive match on name or pid
    pub fn filter(&self, query: &str) -> Vec<&ProcessRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.processes.iter().collect();
        }
        self.processes
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query) || p.pid.to_string().contains(&query)
            })
            .collect()
    }
}

/// Static-ish host information, refreshed on a slow cadence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub hostname: String,
    pub boot_time: i64,
    pub uptime_secs: u64,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub cpu_brand: String,
    pub cpu_frequency_mhz: u64,
    pub memory_total_gb: f64,
    pub disk_mount: String,
    pub disk_total_gb: f64,
    pub disk_used_gb: f64,
}

/// One-shot detail block for a single process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDetails {
    pub pid: u32,
    pub name: String,
    pub parent_pid: Option<u32>,
    pub executable: Option<String>,
    pub working_dir: Option<String>,
    pub user: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_mb: f64,
    pub threads: usize,
    pub status: String,
    pub start_time: i64,
}
