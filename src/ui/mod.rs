// UI and formatting module

pub mod formatters;
pub mod system_formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_duration, format_rate, sparkline};
pub use system_formatters::{
    cpu_trend, print_alerts, print_process_details, print_process_table, print_system_info,
    print_termination_report, snapshot_line,
};
