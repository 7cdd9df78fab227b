use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::system_monitor::MetricsRuntime;
use crate::ui::print_termination_report;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let pids: Vec<u32> = matches
        .get_many::<u32>("pids")
        .context("At least one PID is required")?
        .copied()
        .collect();

    let config = super::load_config()?;
    let runtime = MetricsRuntime::new(&config).context("Failed to start metrics engine")?;

    let report = runtime.terminate(&pids);
    runtime.shutdown();

    print_termination_report(&report);
    println!(
        "{}",
        format!("{} succeeded, {} failed", report.succeeded, report.failed).dimmed()
    );

    if report.succeeded == 0 {
        bail!("No process was terminated");
    }
    Ok(())
}
