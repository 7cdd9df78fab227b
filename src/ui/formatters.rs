use chrono::{DateTime, Local, TimeZone};
use colored::{ColoredString, Colorize};
use humansize::{format_size, BINARY};

use crate::core::system_monitor::BatteryTime;

/// Format a byte rate, e.g. "1 KiB/s"
pub fn format_rate(bytes_per_sec: f64) -> String {
    let bytes = if bytes_per_sec.is_finite() && bytes_per_sec > 0.0 {
        bytes_per_sec.round() as u64
    } else {
        0
    };
    format!("{}/s", format_size(bytes, BINARY))
}

/// Format seconds as "2d 3h 4m", "3h 4m" or "4m 5s"
pub fn format_duration(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

pub fn format_battery_time(time: &BatteryTime) -> String {
    match time {
        BatteryTime::Seconds(secs) => format_duration(*secs),
        BatteryTime::Unlimited => "plugged in".to_string(),
        BatteryTime::Unknown => "unknown".to_string(),
    }
}

/// Format a unix timestamp (seconds) in local time (YYYY-MM-DD HH:MM:SS)
pub fn format_unix_time(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Format a millisecond timestamp as local wall-clock time (HH:MM:SS)
pub fn format_clock(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Percentage coloured by load: green, yellow from `warn`, red from `critical`
pub fn colorize_percent(value: f64, warn: f64, critical: f64) -> ColoredString {
    let text = format!("{:5.1}%", value);
    if value >= critical {
        text.red().bold()
    } else if value >= warn {
        text.yellow()
    } else {
        text.green()
    }
}

/// One-line bar chart of a history, scaled to `max` (or the series max when 0)
pub fn sparkline(values: &[f64], max: f64) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let ceiling = if max > 0.0 {
        max
    } else {
        values.iter().copied().fold(0.0, f64::max)
    };

    values
        .iter()
        .map(|&v| {
            if ceiling <= 0.0 || !v.is_finite() {
                return BARS[0];
            }
            let level = ((v / ceiling).clamp(0.0, 1.0) * (BARS.len() - 1) as f64).round();
            BARS[level as usize]
        })
        .collect()
}
