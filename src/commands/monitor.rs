//! Live metrics stream.
//!
//! Starts the engine and polls it on a short consumer timer, printing one
//! line (or one JSON document) per published snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::system_monitor::{evaluate_alerts, EngineUpdate, MetricsRuntime};
use crate::ui::{cpu_trend, print_alerts, print_system_info, snapshot_line};

/// Consumer refresh period, independent of the sampling interval
const CONSUMER_REFRESH: Duration = Duration::from_millis(100);

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let mut config = super::load_config()?;
    if let Some(&interval) = matches.get_one::<u64>("interval") {
        config.sample_interval_ms = interval;
    }
    let json_output = matches.get_flag("json");
    let max_ticks = matches.get_one::<u64>("ticks").copied();

    let keep_running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&keep_running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .context("Failed to install Ctrl+C handler")?;

    let mut runtime = MetricsRuntime::new(&config).context("Failed to start metrics engine")?;

    if !json_output {
        println!(
            "{}",
            format!(
                "Sampling every {} ms. Press Ctrl+C to stop.",
                config.sample_interval_ms
            )
            .dimmed()
        );
    }

    let mut printed: u64 = 0;
    let mut info_shown = false;

    'consume: while keep_running.load(Ordering::SeqCst) {
        for update in runtime.drain() {
            match update {
                EngineUpdate::Metrics(snapshot) => {
                    if json_output {
                        println!("{}", serde_json::to_string(&*snapshot)?);
                    } else {
                        println!("{}", snapshot_line(&snapshot, &config.alerts));
                        let alerts = evaluate_alerts(&snapshot, &config.alerts);
                        if !alerts.is_empty() {
                            print_alerts(&alerts);
                        }
                    }

                    printed += 1;
                    if max_ticks.is_some_and(|max| printed >= max) {
                        if !json_output {
                            println!("{} {}", "CPU".dimmed(), cpu_trend(&snapshot));
                        }
                        break 'consume;
                    }
                }
                EngineUpdate::SystemInfo(info) if !json_output && !info_shown => {
                    print_system_info(&info);
                    println!();
                    info_shown = true;
                }
                _ => {}
            }
        }

        thread::sleep(CONSUMER_REFRESH);
    }

    runtime.shutdown();
    Ok(())
}
