//! Per-tick sampling logic.
//!
//! The `Sampler` owns everything the loop mutates: the counter source, the
//! previous counter readings, the value cache and the history buffers. The
//! runtime drives it once per period; tests drive it directly with explicit
//! instants so elapsed-time arithmetic is deterministic.

use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::error::Result;

use super::history::MetricsHistory;
use super::metrics::{
    bytes_to_gb, CpuMetrics, DiskMetrics, IoRates, MemoryMetrics, PowerStatus, SystemSnapshot,
    TemperatureReading,
};
use super::rate::rate;
use super::source::{CounterSource, IoCounters};

/// Fires once per period using an explicit next-due timestamp.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    period: Duration,
    next_due: Instant,
}

impl Schedule {
    /// A schedule that is due immediately
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    /// Returns true and re-arms when due
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.next_due = now + self.period;
            true
        } else {
            false
        }
    }

    pub fn mark_due(&mut self, now: Instant) {
        self.next_due = now;
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}

#[derive(Debug, Clone, Copy)]
struct StampedCounters {
    counters: IoCounters,
    taken_at: Instant,
}

/// Last cumulative readings for the network and disk counters
#[derive(Debug, Clone, Default)]
pub struct CounterState {
    network: Option<StampedCounters>,
    disk: Option<StampedCounters>,
}

impl CounterState {
    /// Rate since the previous reading in `slot`, then store `current`.
    /// The first reading yields zero rates.
    fn advance(slot: &mut Option<StampedCounters>, current: IoCounters, now: Instant) -> IoRates {
        let rates = match *slot {
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev.taken_at).as_secs_f64();
                IoRates {
                    outbound_bytes_per_sec: rate(
                        prev.counters.outbound_bytes,
                        current.outbound_bytes,
                        elapsed,
                    ),
                    inbound_bytes_per_sec: rate(
                        prev.counters.inbound_bytes,
                        current.inbound_bytes,
                        elapsed,
                    ),
                }
            }
            None => IoRates::default(),
        };

        *slot = Some(StampedCounters {
            counters: current,
            taken_at: now,
        });
        rates
    }

    pub fn advance_network(&mut self, current: IoCounters, now: Instant) -> IoRates {
        Self::advance(&mut self.network, current, now)
    }

    pub fn advance_disk(&mut self, current: IoCounters, now: Instant) -> IoRates {
        Self::advance(&mut self.disk, current, now)
    }

    pub fn network(&self) -> Option<IoCounters> {
        self.network.map(|s| s.counters)
    }

    pub fn disk(&self) -> Option<IoCounters> {
        self.disk.map(|s| s.counters)
    }
}

/// Background work the sampler asks the runtime to run off-loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    ProcessScan,
    SystemInfo,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: SystemSnapshot,
    pub jobs: Vec<Job>,
    /// Reads that failed this tick and fell back to cached values
    pub failed_reads: usize,
}

/// Last known value of every metric; survives failed reads
#[derive(Debug, Clone, Default)]
struct MetricCache {
    cpu: CpuMetrics,
    memory: MemoryMetrics,
    disk: DiskMetrics,
    network: IoRates,
    disk_io: IoRates,
    power: Option<PowerStatus>,
    temperatures: Vec<TemperatureReading>,
    process_count: usize,
}

pub struct Sampler {
    source: Box<dyn CounterSource>,
    disk_mount: String,
    history: MetricsHistory,
    counters: CounterState,
    cache: MetricCache,
    process_schedule: Schedule,
    info_schedule: Schedule,
    power_schedule: Schedule,
    tick: u64,
}

impl Sampler {
    pub fn new(source: Box<dyn CounterSource>, config: &Config, now: Instant) -> Self {
        let cores = source.logical_cores();
        let cache = MetricCache {
            cpu: CpuMetrics {
                per_core_usage: vec![0.0; cores],
                ..Default::default()
            },
            disk: DiskMetrics {
                mount_point: config.disk_mount.clone(),
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            source,
            disk_mount: config.disk_mount.clone(),
            history: MetricsHistory::with_capacity(config.history_len, cores),
            counters: CounterState::default(),
            cache,
            process_schedule: Schedule::new(config.process_interval(), now),
            info_schedule: Schedule::new(config.system_info_interval(), now),
            power_schedule: Schedule::new(config.power_interval(), now),
            tick: 0,
        }
    }

    /// Throwaway first reading: seeds the counter state and the CPU usage
    /// baseline so the first real tick produces meaningful deltas.
    pub fn prime(&mut self, now: Instant) {
        self.source.refresh();
        if let Err(e) = self.source.cpu() {
            log::warn!("Initial CPU reading failed: {}", e);
        }
        match self.source.network_io() {
            Ok(net) => {
                self.counters.advance_network(net, now);
            }
            Err(e) => log::warn!("Initial network counter reading failed: {}", e),
        }
        match self.source.disk_io() {
            Ok(disk) => {
                self.counters.advance_disk(disk, now);
            }
            Err(e) => log::warn!("Initial disk counter reading failed: {}", e),
        }
    }

    /// Sample every source once, update history and build the snapshot.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut failed_reads = 0;
        self.source.refresh();

        // Gauges
        match self.source.cpu() {
            Ok(cpu) => {
                self.cache.cpu = CpuMetrics {
                    global_usage: cpu.global_usage,
                    per_core_usage: cpu.per_core_usage,
                    frequency_mhz: cpu.frequency_mhz,
                };
            }
            Err(e) => failed_reads += note_failure("CPU", e),
        }

        match self.source.memory() {
            Ok(mem) => {
                self.cache.memory = MemoryMetrics {
                    usage_percent: mem.usage_percent(),
                    total_gb: bytes_to_gb(mem.total_bytes),
                    used_gb: bytes_to_gb(mem.used_bytes),
                    available_gb: bytes_to_gb(mem.available_bytes),
                };
            }
            Err(e) => failed_reads += note_failure("memory", e),
        }

        match self.source.disk_space(&self.disk_mount) {
            Ok(disk) => {
                self.cache.disk = DiskMetrics {
                    mount_point: self.disk_mount.clone(),
                    usage_percent: disk.usage_percent(),
                    total_gb: bytes_to_gb(disk.total_bytes),
                    used_gb: bytes_to_gb(disk.used_bytes()),
                    free_gb: bytes_to_gb(disk.available_bytes),
                };
            }
            Err(e) => failed_reads += note_failure("disk space", e),
        }

        // Counters
        match self.source.network_io() {
            Ok(net) => self.cache.network = self.counters.advance_network(net, now),
            Err(e) => failed_reads += note_failure("network counters", e),
        }

        match self.source.disk_io() {
            Ok(disk) => self.cache.disk_io = self.counters.advance_disk(disk, now),
            Err(e) => failed_reads += note_failure("disk counters", e),
        }

        // Slow-changing readings
        if self.power_schedule.fire_if_due(now) {
            match self.source.power() {
                Ok(power) => self.cache.power = power,
                Err(e) => failed_reads += note_failure("battery", e),
            }
            match self.source.temperatures() {
                Ok(temps) => self.cache.temperatures = temps,
                Err(e) => failed_reads += note_failure("temperatures", e),
            }
        }

        self.record_history();

        let mut jobs = Vec::new();
        if self.process_schedule.fire_if_due(now) {
            jobs.push(Job::ProcessScan);
        }
        if self.info_schedule.fire_if_due(now) {
            jobs.push(Job::SystemInfo);
        }

        self.tick += 1;

        TickOutcome {
            snapshot: self.build_snapshot(),
            jobs,
            failed_reads,
        }
    }

    fn record_history(&mut self) {
        let cache = &self.cache;
        let history = &mut self.history;

        history.cpu_usage.push(cache.cpu.global_usage);
        history.memory_usage.push(cache.memory.usage_percent);
        history.disk_usage.push(cache.disk.usage_percent);
        history.push_network(
            cache.network.outbound_bytes_per_sec,
            cache.network.inbound_bytes_per_sec,
        );
        history.push_disk_io(
            cache.disk_io.inbound_bytes_per_sec,
            cache.disk_io.outbound_bytes_per_sec,
        );
        history.push_cores(&cache.cpu.per_core_usage);
        history.cpu_frequency.push(cache.cpu.frequency_mhz);
        history
            .temperature
            .push(cpu_temperature(&cache.temperatures).unwrap_or(0.0) as f64);
        history.process_count.push(cache.process_count as f64);
    }

    /// Assemble an immutable snapshot from the current cache and histories
    pub fn build_snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            tick: self.tick,
            timestamp: chrono::Utc::now().timestamp_millis(),
            cpu: self.cache.cpu.clone(),
            memory: self.cache.memory.clone(),
            disk: self.cache.disk.clone(),
            network: self.cache.network,
            disk_io: self.cache.disk_io,
            power: self.cache.power.clone(),
            temperatures: self.cache.temperatures.clone(),
            process_count: self.cache.process_count,
            history: self.history.snapshot(),
        }
    }

    /// Make every slow refresh due on the next tick
    pub fn force_due(&mut self, now: Instant) {
        self.process_schedule.mark_due(now);
        self.info_schedule.mark_due(now);
        self.power_schedule.mark_due(now);
    }

    /// Latest process count reported by the process scanner
    pub fn set_process_count(&mut self, count: usize) {
        self.cache.process_count = count;
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

fn note_failure(what: &str, err: crate::error::MonitorError) -> usize {
    if err.is_transient() {
        log::warn!("Failed to read {} this tick, keeping last value: {}", what, err);
    } else {
        log::error!("Unexpected error reading {}, keeping last value: {}", what, err);
    }
    1
}

/// Pick the sensor most likely to be the CPU package
pub fn cpu_temperature(readings: &[TemperatureReading]) -> Option<f32> {
    const CPU_LABELS: [&str; 5] = ["coretemp", "package", "tctl", "cpu", "acpitz"];

    CPU_LABELS
        .iter()
        .find_map(|needle| {
            readings
                .iter()
                .find(|r| r.label.to_lowercase().contains(needle))
        })
        .or_else(|| readings.first())
        .map(|r| r.current_celsius)
}

/// Read the system once and drop the handles; used when no loop is running
pub fn sample_once(source: Box<dyn CounterSource>, config: &Config) -> Result<SystemSnapshot> {
    config.validate()?;
    let start = Instant::now();
    let mut sampler = Sampler::new(source, config, start);
    sampler.prime(start);
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    Ok(sampler.tick(Instant::now()).snapshot)
}
