use std::path::Path;

use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, Pid, Process,
    ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, RefreshKind, Signal, System,
    UpdateKind, Users,
};

use crate::error::{MonitorError, Result};

use super::metrics::{
    bytes_to_gb, BatteryTime, PowerStatus, ProcessDetails, SystemInfo, TemperatureReading,
};
use super::process_table::UNKNOWN_USER;
use super::source::{
    CounterSource, CpuReading, DiskSpaceReading, IoCounters, MemoryReading, ProbeError,
    ProcessProbe, ProcessSource, RawProcess, SystemInfoSource,
};

/// Gauges and counters backed by sysinfo and the battery crate
pub struct SysinfoCollector {
    system: System,
    components: Components,
    disks: Disks,
    networks: Networks,
    logical_cores: usize,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        let system = System::new_with_specifics(refresh_kind);
        let logical_cores = system.cpus().len().max(1);

        Self {
            system,
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            logical_cores,
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoCollector {
    fn refresh(&mut self) {
        self.system.refresh_cpu_all();
        self.system.refresh_memory();
        self.disks.refresh(true);
        self.networks.refresh(true);
    }

    fn cpu(&mut self) -> Result<CpuReading> {
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(MonitorError::collection("no CPUs reported"));
        }

        let frequency_mhz =
            cpus.iter().map(|cpu| cpu.frequency() as f64).sum::<f64>() / cpus.len() as f64;

        Ok(CpuReading {
            global_usage: self.system.global_cpu_usage() as f64,
            per_core_usage: cpus.iter().map(|cpu| cpu.cpu_usage() as f64).collect(),
            frequency_mhz,
        })
    }

    fn memory(&mut self) -> Result<MemoryReading> {
        let total = self.system.total_memory();
        if total == 0 {
            return Err(MonitorError::collection("total memory reported as 0"));
        }

        Ok(MemoryReading {
            total_bytes: total,
            used_bytes: self.system.used_memory(),
            available_bytes: self.system.available_memory(),
        })
    }

    fn disk_space(&mut self, mount_point: &str) -> Result<DiskSpaceReading> {
        let disk = self
            .disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new(mount_point))
            .ok_or_else(|| {
                MonitorError::collection(format!("no disk mounted at {}", mount_point))
            })?;

        Ok(DiskSpaceReading {
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        })
    }

    fn disk_io(&mut self) -> Result<IoCounters> {
        if self.disks.is_empty() {
            return Err(MonitorError::collection("no disks reported"));
        }

        Ok(self
            .disks
            .iter()
            .map(|disk| disk.usage())
            .fold(IoCounters::default(), |acc, usage| IoCounters {
                outbound_bytes: acc.outbound_bytes.saturating_add(usage.total_written_bytes),
                inbound_bytes: acc.inbound_bytes.saturating_add(usage.total_read_bytes),
            }))
    }

    fn network_io(&mut self) -> Result<IoCounters> {
        Ok(self
            .networks
            .values()
            .fold(IoCounters::default(), |acc, data| IoCounters {
                outbound_bytes: acc.outbound_bytes.saturating_add(data.total_transmitted()),
                inbound_bytes: acc.inbound_bytes.saturating_add(data.total_received()),
            }))
    }

    fn power(&mut self) -> Result<Option<PowerStatus>> {
        collect_battery()
    }

    fn temperatures(&mut self) -> Result<Vec<TemperatureReading>> {
        self.components.refresh(true);

        Ok(self
            .components
            .iter()
            .filter_map(|comp| {
                Some(TemperatureReading {
                    label: comp.label().to_string(),
                    current_celsius: comp.temperature()?,
                    max_celsius: comp.max().unwrap_or(0.0),
                    critical_celsius: comp.critical(),
                })
            })
            .collect())
    }

    fn logical_cores(&self) -> usize {
        self.logical_cores
    }
}

/// Battery status of the first battery, `None` on hosts without one.
///
/// The manager is created per call; this runs on the slow power cadence.
fn collect_battery() -> Result<Option<PowerStatus>> {
    use battery::units::{ratio::percent, time::second};
    use battery::State;

    let manager =
        battery::Manager::new().map_err(|e| MonitorError::collection(e.to_string()))?;
    let mut batteries = manager
        .batteries()
        .map_err(|e| MonitorError::collection(e.to_string()))?;

    let battery = match batteries.next() {
        Some(battery) => battery.map_err(|e| MonitorError::collection(e.to_string()))?,
        None => return Ok(None),
    };

    let plugged_in = matches!(battery.state(), State::Charging | State::Full);
    let time_remaining = if plugged_in {
        BatteryTime::Unlimited
    } else {
        battery
            .time_to_empty()
            .map(|t| BatteryTime::Seconds(t.get::<second>() as u64))
            .unwrap_or(BatteryTime::Unknown)
    };

    Ok(Some(PowerStatus {
        battery_percent: battery.state_of_charge().get::<percent>(),
        plugged_in,
        time_remaining,
    }))
}

/// Process enumeration, per-process control and host info backed by sysinfo
pub struct SysinfoProcessCollector {
    system: System,
    users: Users,
    logical_cores: usize,
}

impl SysinfoProcessCollector {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_frequency())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        let logical_cores = system.cpus().len().max(1);

        Self {
            system,
            users: Users::new_with_refreshed_list(),
            logical_cores,
        }
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_tasks()
            .with_user(UpdateKind::OnlyIfNotSet)
    }

    fn user_name(&self, process: &Process) -> Option<String> {
        process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
    }

    fn memory_percent(&self, process: &Process) -> f32 {
        let total = self.system.total_memory();
        if total > 0 {
            (process.memory() as f32 / total as f32) * 100.0
        } else {
            0.0
        }
    }

    fn probe(&self, process: &Process) -> ProcessProbe {
        if matches!(process.status(), ProcessStatus::Dead) {
            return Err(ProbeError::Vanished);
        }

        Ok(RawProcess {
            pid: process.pid().as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            cpu_percent: process.cpu_usage(),
            memory_percent: self.memory_percent(process),
            memory_bytes: process.memory(),
            threads: thread_count(process),
            status: process.status().to_string(),
            user: self.user_name(process),
        })
    }
}

impl Default for SysinfoProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn thread_count(process: &Process) -> usize {
    process.tasks().map(|tasks| tasks.len().max(1)).unwrap_or(1)
}

impl ProcessSource for SysinfoProcessCollector {
    fn processes(&mut self) -> Result<Vec<ProcessProbe>> {
        // Accounts created after startup must resolve too
        self.users.refresh();
        self.system.refresh_memory();
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, Self::refresh_kind());

        Ok(self
            .system
            .processes()
            .values()
            .map(|process| self.probe(process))
            .collect())
    }

    fn logical_cores(&self) -> usize {
        self.logical_cores
    }

    fn process_details(&mut self, pid: u32) -> Result<ProcessDetails> {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_memory();
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let process = self
            .system
            .process(sys_pid)
            .ok_or(MonitorError::ProcessNotFound(pid))?;

        Ok(ProcessDetails {
            pid,
            name: process.name().to_string_lossy().into_owned(),
            parent_pid: process.parent().map(|p| p.as_u32()),
            executable: process.exe().map(|p| p.display().to_string()),
            working_dir: process.cwd().map(|p| p.display().to_string()),
            user: self
                .user_name(process)
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            cpu_percent: super::process_table::normalize_cpu(
                process.cpu_usage(),
                self.logical_cores,
            ),
            memory_percent: self.memory_percent(process),
            memory_mb: process.memory() as f64 / (1024.0 * 1024.0),
            threads: thread_count(process),
            status: process.status().to_string(),
            start_time: process.start_time() as i64,
        })
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::nothing(),
        );

        let process = self
            .system
            .process(sys_pid)
            .ok_or(MonitorError::ProcessNotFound(pid))?;

        // SIGTERM where supported, hard kill elsewhere (Windows)
        let delivered = process
            .kill_with(Signal::Term)
            .unwrap_or_else(|| process.kill());

        if delivered {
            Ok(())
        } else {
            Err(MonitorError::AccessDenied(pid))
        }
    }
}

impl SystemInfoSource for SysinfoProcessCollector {
    fn system_info(&mut self, disk_mount: &str) -> Result<SystemInfo> {
        self.system.refresh_memory();
        self.system.refresh_cpu_frequency();

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_used) = disks
            .iter()
            .find(|disk| disk.mount_point() == Path::new(disk_mount))
            .map(|disk| {
                let total = disk.total_space();
                (total, total.saturating_sub(disk.available_space()))
            })
            .unwrap_or((0, 0));

        let cpus = self.system.cpus();

        Ok(SystemInfo {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::long_os_version()
                .or_else(System::os_version)
                .unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            boot_time: System::boot_time() as i64,
            uptime_secs: System::uptime(),
            physical_cores: System::physical_core_count(),
            logical_cores: self.logical_cores,
            cpu_brand: cpus
                .first()
                .map(|c| c.brand().to_string())
                .unwrap_or_default(),
            cpu_frequency_mhz: cpus.first().map(|c| c.frequency()).unwrap_or(0),
            memory_total_gb: bytes_to_gb(self.system.total_memory()),
            disk_mount: disk_mount.to_string(),
            disk_total_gb: bytes_to_gb(disk_total),
            disk_used_gb: bytes_to_gb(disk_used),
        })
    }
}
