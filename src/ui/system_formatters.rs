use colored::*;

use crate::core::system_monitor::{
    Alert, AlertConfig, AlertSeverity, ProcessDetails, ProcessHighlight, ProcessRecord, SystemInfo,
    SystemSnapshot, TerminationReport,
};
use crate::ui::formatters::{
    colorize_percent, format_battery_time, format_clock, format_duration, format_rate,
    format_unix_time, sparkline,
};

/// Compact one-line summary of a snapshot, percentages coloured by `thresholds`
pub fn snapshot_line(snapshot: &SystemSnapshot, thresholds: &AlertConfig) -> String {
    let mut line = format!(
        "[{}] #{:<5} CPU {} MEM {} DISK {} NET ↑{} ↓{} IO r{} w{} PROCS {}",
        format_clock(snapshot.timestamp),
        snapshot.tick,
        colorize_percent(
            snapshot.cpu.global_usage,
            thresholds.cpu_warning,
            thresholds.cpu_critical
        ),
        colorize_percent(
            snapshot.memory.usage_percent,
            thresholds.memory_warning,
            thresholds.memory_critical
        ),
        colorize_percent(
            snapshot.disk.usage_percent,
            thresholds.disk_warning,
            thresholds.disk_critical
        ),
        format_rate(snapshot.network.outbound_bytes_per_sec),
        format_rate(snapshot.network.inbound_bytes_per_sec),
        format_rate(snapshot.disk_io.inbound_bytes_per_sec),
        format_rate(snapshot.disk_io.outbound_bytes_per_sec),
        snapshot.process_count,
    );

    if let Some(power) = &snapshot.power {
        line.push_str(&format!(
            " BAT {:.0}% ({})",
            power.battery_percent,
            format_battery_time(&power.time_remaining)
        ));
    }

    line
}

/// CPU history as a sparkline, oldest sample first
pub fn cpu_trend(snapshot: &SystemSnapshot) -> String {
    sparkline(&snapshot.history.cpu_usage, 100.0)
}

pub fn print_alerts(alerts: &[Alert]) {
    for alert in alerts {
        let tag = match alert.severity {
            AlertSeverity::Critical => "CRIT".red().bold(),
            AlertSeverity::Warning => "WARN".yellow().bold(),
        };
        println!("  {} {}", tag, alert.message);
    }
}

fn print_section_header(title: &str) {
    println!("\n{}", title.bold().green());
    println!("{}", "-".repeat(title.chars().count()));
}

/// Print rows as they are given; `total_seen` is the scan's full count
pub fn print_process_table(rows: &[&ProcessRecord], total_seen: usize) {
    println!(
        "{}",
        format!(
            "{:>7}  {:<28} {:>7} {:>7} {:>10} {:>5}  {:<10} {}",
            "PID", "NAME", "CPU%", "MEM%", "MEM", "THR", "STATUS", "USER"
        )
        .bold()
    );

    for record in rows {
        println!("{}", process_row(record));
    }

    println!(
        "{}",
        format!("Showing {} of {} processes", rows.len(), total_seen).dimmed()
    );
}

fn process_row(record: &ProcessRecord) -> ColoredString {
    let name: String = record.name.chars().take(28).collect();
    let row = format!(
        "{:>7}  {:<28} {:>7.1} {:>7.1} {:>8.1}MB {:>5}  {:<10} {}",
        record.pid,
        name,
        record.cpu_percent,
        record.memory_percent,
        record.memory_mb,
        record.threads,
        record.status,
        record.user
    );

    match record.highlight() {
        ProcessHighlight::HighCpu => row.red(),
        ProcessHighlight::HighMemory => row.yellow(),
        ProcessHighlight::Normal => row.normal(),
    }
}

pub fn print_process_details(details: &ProcessDetails) {
    print_section_header(&format!("Process {}", details.pid));

    println!("  Name: {}", details.name.cyan().bold());
    if let Some(parent) = details.parent_pid {
        println!("  Parent PID: {}", parent);
    }
    println!("  User: {}", details.user);
    println!("  Status: {}", details.status);
    println!("  CPU: {:.1}%", details.cpu_percent);
    println!(
        "  Memory: {:.1} MB ({:.1}%)",
        details.memory_mb, details.memory_percent
    );
    println!("  Threads: {}", details.threads);
    println!("  Started: {}", format_unix_time(details.start_time));
    println!(
        "  Executable: {}",
        details.executable.as_deref().unwrap_or("-")
    );
    println!(
        "  Working dir: {}",
        details.working_dir.as_deref().unwrap_or("-")
    );
}

pub fn print_system_info(info: &SystemInfo) {
    print_section_header("System");

    println!("  Host: {}", info.hostname);
    println!("  OS: {} {}", info.os_name, info.os_version);
    if let Some(kernel) = &info.kernel_version {
        println!("  Kernel: {}", kernel);
    }
    println!("  Uptime: {}", format_duration(info.uptime_secs));
    println!(
        "  CPU: {} ({} logical cores{}) @ {} MHz",
        info.cpu_brand,
        info.logical_cores,
        info.physical_cores
            .map(|p| format!(", {} physical", p))
            .unwrap_or_default(),
        info.cpu_frequency_mhz
    );
    println!("  Memory: {:.1} GB", info.memory_total_gb);
    println!(
        "  Disk {}: {:.1} / {:.1} GB",
        info.disk_mount, info.disk_used_gb, info.disk_total_gb
    );
}

pub fn print_termination_report(report: &TerminationReport) {
    if report.succeeded > 0 {
        println!(
            "{}",
            format!("✓ Terminated {} process(es)", report.succeeded).green()
        );
    }

    for failure in &report.failures {
        println!(
            "{}",
            format!("✗ pid {}: {}", failure.pid, failure.reason).red()
        );
    }
}
