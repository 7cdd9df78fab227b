//! In-memory sources shared by the integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use syspulse::core::system_monitor::source::{
    CounterSource, CpuReading, DiskSpaceReading, IoCounters, MemoryReading, ProbeError,
    ProcessProbe, ProcessSource, RawProcess, SystemInfoSource,
};
use syspulse::core::system_monitor::{PowerStatus, ProcessDetails, SystemInfo, TemperatureReading};
use syspulse::error::{MonitorError, Result};

/// Counters driven from the test through a shared handle
#[derive(Clone, Default)]
pub struct CounterHandle {
    pub net_received: Arc<AtomicU64>,
    pub net_sent: Arc<AtomicU64>,
}

impl CounterHandle {
    pub fn set_received(&self, bytes: u64) {
        self.net_received.store(bytes, Ordering::SeqCst);
    }
}

pub struct FakeCounters {
    pub cores: usize,
    pub cpu_usage: f64,
    pub handle: CounterHandle,
    /// Bytes added to every counter on each read
    pub auto_increment: u64,
    pub cpu_calls: Arc<AtomicU64>,
    /// `cpu()` panics on this call number (1-based)
    pub panic_on_cpu_call: Option<u64>,
}

impl FakeCounters {
    pub fn new(cores: usize) -> Self {
        Self {
            cores,
            cpu_usage: 42.0,
            handle: CounterHandle::default(),
            auto_increment: 0,
            cpu_calls: Arc::new(AtomicU64::new(0)),
            panic_on_cpu_call: None,
        }
    }
}

impl CounterSource for FakeCounters {
    fn cpu(&mut self) -> Result<CpuReading> {
        let call = self.cpu_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on_cpu_call == Some(call) {
            panic!("cpu counters unreadable on call {}", call);
        }
        Ok(CpuReading {
            global_usage: self.cpu_usage,
            per_core_usage: vec![self.cpu_usage; self.cores],
            frequency_mhz: 3000.0,
        })
    }

    fn memory(&mut self) -> Result<MemoryReading> {
        Ok(MemoryReading {
            total_bytes: 8 * 1024 * 1024 * 1024,
            used_bytes: 2 * 1024 * 1024 * 1024,
            available_bytes: 6 * 1024 * 1024 * 1024,
        })
    }

    fn disk_space(&mut self, _mount_point: &str) -> Result<DiskSpaceReading> {
        Ok(DiskSpaceReading {
            total_bytes: 100,
            available_bytes: 40,
        })
    }

    fn disk_io(&mut self) -> Result<IoCounters> {
        Err(MonitorError::collection("no block devices"))
    }

    fn network_io(&mut self) -> Result<IoCounters> {
        let step = self.auto_increment;
        Ok(IoCounters {
            outbound_bytes: self.handle.net_sent.fetch_add(step, Ordering::SeqCst) + step,
            inbound_bytes: self.handle.net_received.fetch_add(step, Ordering::SeqCst) + step,
        })
    }

    fn power(&mut self) -> Result<Option<PowerStatus>> {
        Ok(None)
    }

    fn temperatures(&mut self) -> Result<Vec<TemperatureReading>> {
        Ok(vec![TemperatureReading {
            label: "coretemp Package id 0".to_string(),
            current_celsius: 55.0,
            max_celsius: 70.0,
            critical_celsius: Some(100.0),
        }])
    }

    fn logical_cores(&self) -> usize {
        self.cores
    }
}

pub fn raw_process(pid: u32, name: &str, cpu: f32) -> RawProcess {
    RawProcess {
        pid,
        name: name.to_string(),
        cpu_percent: cpu,
        memory_percent: 0.5,
        memory_bytes: 4 * 1024 * 1024,
        threads: 2,
        status: "Sleep".to_string(),
        user: Some("tester".to_string()),
    }
}

/// Three processes, one of them pid 0, plus one that vanishes mid-scan
pub struct FakeHost {
    pub cores: usize,
    pub killable: Vec<u32>,
    pub scans: Arc<AtomicU64>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            cores: 4,
            killable: vec![42],
            scans: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl ProcessSource for FakeHost {
    fn processes(&mut self) -> Result<Vec<ProcessProbe>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(vec![
            Ok(raw_process(0, "idle", 380.0)),
            Ok(raw_process(42, "worker", 200.0)),
            Err(ProbeError::Vanished),
            Ok(raw_process(7, "shell", 8.0)),
        ])
    }

    fn logical_cores(&self) -> usize {
        self.cores
    }

    fn process_details(&mut self, pid: u32) -> Result<ProcessDetails> {
        if pid != 42 {
            return Err(MonitorError::ProcessNotFound(pid));
        }
        Ok(ProcessDetails {
            pid,
            name: "worker".to_string(),
            parent_pid: Some(1),
            executable: Some("/usr/bin/worker".to_string()),
            working_dir: None,
            user: "tester".to_string(),
            cpu_percent: 50.0,
            memory_percent: 0.5,
            memory_mb: 4.0,
            threads: 2,
            status: "Run".to_string(),
            start_time: 0,
        })
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        if self.killable.contains(&pid) {
            Ok(())
        } else {
            Err(MonitorError::AccessDenied(pid))
        }
    }
}

impl SystemInfoSource for FakeHost {
    fn system_info(&mut self, disk_mount: &str) -> Result<SystemInfo> {
        Ok(SystemInfo {
            os_name: "TestOS".to_string(),
            hostname: "testbox".to_string(),
            logical_cores: self.cores,
            disk_mount: disk_mount.to_string(),
            ..Default::default()
        })
    }
}
