//! System metrics engine.
//!
//! Sampling, rate derivation, rolling histories and process enumeration,
//! run on a background runtime and published to the presentation layer
//! through latest-wins channels.

pub mod alerts;
mod channel;
mod collector;
mod history;
mod metrics;
pub mod process_control;
pub mod process_table;
pub mod rate;
mod runtime;
pub mod sampler;
pub mod source;

pub use alerts::{evaluate_alerts, Alert, AlertCategory, AlertConfig, AlertSeverity};
pub use channel::{EngineUpdate, SnapshotSubscriber};
pub use collector::{SysinfoCollector, SysinfoProcessCollector};
pub use history::{HistoryBuffer, MetricsHistory, DEFAULT_HISTORY_SIZE};
pub use metrics::{
    bytes_to_gb, BatteryTime, CpuMetrics, DiskMetrics, HistorySnapshot, IoRates, MemoryMetrics,
    PowerStatus, ProcessDetails, ProcessHighlight, ProcessRecord, ProcessTable, SystemInfo,
    SystemSnapshot, TemperatureReading,
};
pub use process_control::{TerminationFailure, TerminationReport};
pub use process_table::DEFAULT_PROCESS_LIMIT;
pub use runtime::{EngineCommand, MetricsRuntime};
pub use sampler::{sample_once, Sampler};
pub use source::{CounterSource, HostSource, ProcessSource, SystemInfoSource};
