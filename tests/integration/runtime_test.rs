use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

use syspulse::core::config::Config;
use syspulse::core::system_monitor::{EngineUpdate, MetricsRuntime};
use syspulse::error::MonitorError;

use super::fakes::{FakeCounters, FakeHost};

const WAIT: Duration = Duration::from_secs(5);

fn fast_config() -> Config {
    Config {
        sample_interval_ms: 50,
        process_interval_ms: 50,
        system_info_interval_ms: 50,
        power_interval_ms: 50,
        history_len: 10,
        kill_timeout_ms: 2000,
        ..Default::default()
    }
}

fn start(config: &Config) -> MetricsRuntime {
    MetricsRuntime::with_sources(config, Box::new(FakeCounters::new(2)), Box::new(FakeHost::new()))
        .unwrap()
}

/// Poll until `done` holds or the wait limit passes
fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn test_sampling_continues_after_panicking_tick() {
    let mut counters = FakeCounters::new(2);
    // Call 1 is the priming pass, call 3 is the second tick
    counters.panic_on_cpu_call = Some(3);
    let cpu_calls = counters.cpu_calls.clone();
    let runtime =
        MetricsRuntime::with_sources(&fast_config(), Box::new(counters), Box::new(FakeHost::new()))
            .unwrap();

    assert!(wait_until(|| cpu_calls.load(Ordering::SeqCst) >= 3));
    let tick_at_panic = runtime.latest_snapshot().map_or(0, |s| s.tick);

    assert!(wait_until(|| runtime
        .latest_snapshot()
        .is_some_and(|s| s.tick >= tick_at_panic + 2)));
    assert!(cpu_calls.load(Ordering::SeqCst) > 4);
    assert!(runtime.is_running());
    runtime.shutdown();
}

#[test]
fn test_publishes_snapshots_and_tables() {
    let runtime = start(&fast_config());

    assert!(wait_until(|| runtime
        .latest_snapshot()
        .is_some_and(|s| s.tick >= 3)));
    assert!(wait_until(|| runtime.latest_processes().is_some()));
    assert!(wait_until(|| runtime.latest_system_info().is_some()));

    let table = runtime.latest_processes().unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.processes.iter().all(|p| p.pid != 0));

    // The scan's count flows back into the snapshot and its history
    assert!(wait_until(|| runtime
        .latest_snapshot()
        .is_some_and(|s| s.process_count == 2)));
    let snapshot = runtime.latest_snapshot().unwrap();
    assert_eq!(snapshot.history.process_count.len(), 10);
    assert_eq!(snapshot.history.cpu_usage.len(), 10);

    assert_eq!(runtime.latest_system_info().unwrap().hostname, "testbox");
    runtime.shutdown();
}

#[test]
fn test_drain_returns_each_stream_once() {
    let mut runtime = start(&fast_config());
    assert!(wait_until(|| runtime.latest_processes().is_some()));

    let updates = runtime.drain();
    assert!(updates
        .iter()
        .any(|u| matches!(u, EngineUpdate::Metrics(_))));
    assert!(updates.len() <= 3);

    runtime.stop();
    thread::sleep(Duration::from_millis(200));
    runtime.drain();
    assert!(runtime.drain().is_empty());
}

#[test]
fn test_no_publish_after_stop() {
    let runtime = start(&fast_config());
    assert!(wait_until(|| runtime.latest_snapshot().is_some()));

    runtime.stop();
    assert!(!runtime.is_running());
    thread::sleep(Duration::from_millis(100));

    let tick_at_stop = runtime.latest_snapshot().map(|s| s.tick);
    thread::sleep(Duration::from_millis(400));
    assert_eq!(runtime.latest_snapshot().map(|s| s.tick), tick_at_stop);
}

#[test]
fn test_force_update_resamples_immediately() {
    let config = Config {
        sample_interval_ms: 60_000,
        ..fast_config()
    };
    let runtime = start(&config);

    assert!(wait_until(|| runtime.latest_snapshot().is_some()));
    let first = runtime.latest_snapshot().unwrap().tick;

    runtime.force_update();
    assert!(wait_until(|| runtime
        .latest_snapshot()
        .is_some_and(|s| s.tick > first)));
}

#[test]
fn test_terminate_counts_and_rescans() {
    let host = FakeHost::new();
    let scans = host.scans.clone();
    let config = Config {
        process_interval_ms: 60_000,
        ..fast_config()
    };
    let runtime =
        MetricsRuntime::with_sources(&config, Box::new(FakeCounters::new(1)), Box::new(host))
            .unwrap();
    assert!(wait_until(|| runtime.latest_processes().is_some()));
    let scans_before = scans.load(Ordering::SeqCst);

    let report = runtime.terminate(&[42, 7]);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].pid, 7);

    assert!(wait_until(|| scans.load(Ordering::SeqCst) > scans_before));
}

#[test]
fn test_terminate_after_stop_fails_every_pid() {
    let runtime = start(&fast_config());
    runtime.stop();

    let report = runtime.terminate(&[42, 43]);
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded, 0);
}

#[test]
fn test_process_details() {
    let runtime = start(&fast_config());

    let details = runtime.process_details(42).unwrap();
    assert_eq!(details.name, "worker");
    assert_eq!(details.parent_pid, Some(1));

    assert!(matches!(
        runtime.process_details(5),
        Err(MonitorError::ProcessNotFound(5))
    ));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = Config {
        sample_interval_ms: 0,
        ..Default::default()
    };
    let counters = Box::new(FakeCounters::new(1));
    let result = MetricsRuntime::with_sources(&config, counters, Box::new(FakeHost::new()));
    assert!(matches!(result, Err(MonitorError::Config(_))));
}

#[test]
fn test_subscriber_sees_changes() {
    let runtime = start(&fast_config());
    let mut snapshots = runtime.subscribe_snapshots();

    assert!(wait_until(|| snapshots.has_changed().unwrap_or(false)));
    assert!(snapshots.borrow_and_update().is_some());
}
