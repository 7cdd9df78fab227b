use std::time::{Duration, Instant};

use syspulse::core::config::Config;
use syspulse::core::system_monitor::sampler::Job;
use syspulse::core::system_monitor::{sample_once, Sampler};

use super::fakes::FakeCounters;

fn small_config() -> Config {
    Config {
        history_len: 5,
        ..Default::default()
    }
}

#[test]
fn test_network_rate_end_to_end() {
    let counters = FakeCounters::new(2);
    let handle = counters.handle.clone();
    let start = Instant::now();

    handle.set_received(1000);
    let mut sampler = Sampler::new(Box::new(counters), &small_config(), start);
    sampler.prime(start);

    handle.set_received(2024);
    let outcome = sampler.tick(start + Duration::from_secs(1));

    assert!((outcome.snapshot.network.inbound_bytes_per_sec - 1024.0).abs() < 1e-9);
    assert_eq!(outcome.snapshot.network.outbound_bytes_per_sec, 0.0);
    assert_eq!(outcome.snapshot.history.network_received.last(), Some(&1024.0));
    assert_eq!(outcome.snapshot.history.network_total.last(), Some(&1024.0));
}

#[test]
fn test_counter_reset_clamps_to_zero() {
    let counters = FakeCounters::new(1);
    let handle = counters.handle.clone();
    let start = Instant::now();

    handle.set_received(5000);
    let mut sampler = Sampler::new(Box::new(counters), &small_config(), start);
    sampler.prime(start);

    handle.set_received(10);
    let outcome = sampler.tick(start + Duration::from_secs(1));
    assert_eq!(outcome.snapshot.network.inbound_bytes_per_sec, 0.0);
}

#[test]
fn test_snapshot_after_n_ticks() {
    let start = Instant::now();
    let mut sampler = Sampler::new(Box::new(FakeCounters::new(4)), &small_config(), start);
    sampler.prime(start);

    let mut last = None;
    for i in 1..=8u64 {
        last = Some(sampler.tick(start + Duration::from_secs(i)).snapshot);
    }
    let snapshot = last.unwrap();

    assert_eq!(snapshot.tick, 8);
    assert_eq!(snapshot.cpu.global_usage, 42.0);
    assert_eq!(snapshot.cpu.per_core_usage.len(), 4);
    assert_eq!(snapshot.memory.usage_percent, 25.0);
    assert_eq!(snapshot.disk.usage_percent, 60.0);

    let history = &snapshot.history;
    assert_eq!(history.cpu_usage.len(), 5);
    assert_eq!(history.cpu_usage.last(), Some(&42.0));
    assert_eq!(history.memory_usage.len(), 5);
    assert_eq!(history.per_core.len(), 4);
    assert!(history.per_core.iter().all(|core| core.len() == 5));
    assert_eq!(history.cpu_frequency.last(), Some(&3000.0));
    assert_eq!(history.temperature.last(), Some(&55.0));
}

#[test]
fn test_failed_disk_counters_do_not_stop_tick() {
    let start = Instant::now();
    let mut sampler = Sampler::new(Box::new(FakeCounters::new(1)), &small_config(), start);
    sampler.prime(start);

    let outcome = sampler.tick(start + Duration::from_secs(1));
    assert_eq!(outcome.failed_reads, 1);
    assert_eq!(outcome.snapshot.disk_io.total(), 0.0);
    assert_eq!(outcome.snapshot.tick, 1);
}

#[test]
fn test_first_tick_requests_background_jobs() {
    let start = Instant::now();
    let mut sampler = Sampler::new(Box::new(FakeCounters::new(1)), &small_config(), start);
    sampler.prime(start);

    let first = sampler.tick(start);
    assert!(first.jobs.contains(&Job::ProcessScan));
    assert!(first.jobs.contains(&Job::SystemInfo));

    let second = sampler.tick(start + Duration::from_millis(500));
    assert!(second.jobs.is_empty());
}

#[test]
fn test_sample_once() {
    let snapshot = sample_once(Box::new(FakeCounters::new(2)), &Config::default()).unwrap();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.history.cpu_usage.len(), 60);
    assert_eq!(snapshot.temperatures.len(), 1);
}

#[test]
fn test_sample_once_rejects_invalid_config() {
    let config = Config {
        history_len: 0,
        ..Default::default()
    };
    assert!(sample_once(Box::new(FakeCounters::new(1)), &config).is_err());
}
