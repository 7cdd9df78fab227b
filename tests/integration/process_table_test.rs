use syspulse::core::system_monitor::process_control::terminate_all;
use syspulse::core::system_monitor::process_table::{build_process_table, scan};
use syspulse::core::system_monitor::DEFAULT_PROCESS_LIMIT;

use super::fakes::{raw_process, FakeHost};

#[test]
fn test_scan_excludes_pid_zero_and_failed_probes() {
    let mut host = FakeHost::new();
    let table = scan(&mut host, DEFAULT_PROCESS_LIMIT).unwrap();

    assert_eq!(table.len(), 2);
    assert!(table.processes.iter().all(|p| p.pid != 0));
    assert_eq!(table.total_seen, 2);
}

#[test]
fn test_scan_normalizes_and_sorts() {
    let mut host = FakeHost::new();
    let table = scan(&mut host, DEFAULT_PROCESS_LIMIT).unwrap();

    // 200% raw on 4 logical cores
    assert_eq!(table.processes[0].pid, 42);
    assert_eq!(table.processes[0].cpu_percent, 50.0);
    assert_eq!(table.processes[1].cpu_percent, 2.0);
    assert_eq!(table.processes[0].user, "tester");
}

#[test]
fn test_table_never_exceeds_limit() {
    let probes = (1..=1000u32)
        .map(|pid| Ok(raw_process(pid, "bulk", (pid % 13) as f32)))
        .collect();
    let table = build_process_table(probes, 8, DEFAULT_PROCESS_LIMIT);

    assert_eq!(table.len(), DEFAULT_PROCESS_LIMIT);
    assert!(table
        .processes
        .windows(2)
        .all(|pair| pair[0].cpu_percent >= pair[1].cpu_percent));
}

#[test]
fn test_ties_keep_enumeration_order() {
    let probes = vec![
        Ok(raw_process(3, "c", 10.0)),
        Ok(raw_process(1, "a", 10.0)),
        Ok(raw_process(2, "b", 10.0)),
    ];
    let table = build_process_table(probes, 1, 10);
    let pids: Vec<u32> = table.processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![3, 1, 2]);
}

#[test]
fn test_terminate_report_counts() {
    let mut host = FakeHost::new();
    let report = terminate_all(&mut host, &[42, 7, 99]);

    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 2);
    assert!(report.failures.iter().all(|f| f.reason == "access denied"));
}
