//! Threshold flags over a snapshot.
//!
//! Evaluates snapshot values against configurable thresholds. Delivery of the
//! resulting flags is left to the presentation layer.

use super::metrics::SystemSnapshot;
use serde::{Deserialize, Serialize};

/// Alert configuration with thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub cpu_warning: f64,     // %
    pub cpu_critical: f64,    // %
    pub memory_warning: f64,  // %
    pub memory_critical: f64, // %
    pub disk_warning: f64,    // %
    pub disk_critical: f64,   // %
    pub temp_warning: f32,    // °C
    pub temp_critical: f32,   // °C
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cpu_warning: 75.0,
            cpu_critical: 90.0,
            memory_warning: 80.0,
            memory_critical: 95.0,
            disk_warning: 85.0,
            disk_critical: 95.0,
            temp_warning: 70.0,
            temp_critical: 85.0,
        }
    }
}

/// An individual alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    Cpu,
    Memory,
    Disk(String),        // Mount point
    Temperature(String), // Sensor label
}

fn classify(value: f64, warning: f64, critical: f64) -> Option<(AlertSeverity, f64)> {
    if value >= critical {
        Some((AlertSeverity::Critical, critical))
    } else if value >= warning {
        Some((AlertSeverity::Warning, warning))
    } else {
        None
    }
}

fn severity_label(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Warning => "warning",
        AlertSeverity::Critical => "critical",
    }
}

/// Evaluate a snapshot and generate alerts
pub fn evaluate_alerts(snapshot: &SystemSnapshot, config: &AlertConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let cpu = snapshot.cpu.global_usage;
    if let Some((severity, threshold)) = classify(cpu, config.cpu_warning, config.cpu_critical) {
        alerts.push(Alert {
            severity,
            category: AlertCategory::Cpu,
            message: format!(
                "CPU usage at {:.1}% ({} threshold: {:.1}%)",
                cpu,
                severity_label(severity),
                threshold
            ),
            value: cpu,
            threshold,
        });
    }

    let memory = snapshot.memory.usage_percent;
    if let Some((severity, threshold)) =
        classify(memory, config.memory_warning, config.memory_critical)
    {
        alerts.push(Alert {
            severity,
            category: AlertCategory::Memory,
            message: format!(
                "Memory usage at {:.1}% ({} threshold: {:.1}%)",
                memory,
                severity_label(severity),
                threshold
            ),
            value: memory,
            threshold,
        });
    }

    let disk = &snapshot.disk;
    if let Some((severity, threshold)) =
        classify(disk.usage_percent, config.disk_warning, config.disk_critical)
    {
        alerts.push(Alert {
            severity,
            category: AlertCategory::Disk(disk.mount_point.clone()),
            message: format!(
                "Disk {} at {:.1}% capacity ({} threshold: {:.1}%)",
                disk.mount_point,
                disk.usage_percent,
                severity_label(severity),
                threshold
            ),
            value: disk.usage_percent,
            threshold,
        });
    }

    for temp in &snapshot.temperatures {
        let current = temp.current_celsius as f64;
        if let Some((severity, threshold)) = classify(
            current,
            config.temp_warning as f64,
            config.temp_critical as f64,
        ) {
            alerts.push(Alert {
                severity,
                category: AlertCategory::Temperature(temp.label.clone()),
                message: format!(
                    "{} at {:.1}°C ({} threshold: {:.1}°C)",
                    temp.label,
                    current,
                    severity_label(severity),
                    threshold
                ),
                value: current,
                threshold,
            });
        }
    }

    alerts
}
