use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::system_monitor::MetricsRuntime;
use crate::ui::print_process_details;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let pid = *matches
        .get_one::<u32>("pid")
        .context("PID argument is required")?;

    let config = super::load_config()?;
    let runtime = MetricsRuntime::new(&config).context("Failed to start metrics engine")?;

    let details = runtime
        .process_details(pid)
        .with_context(|| format!("Could not read process {}", pid))?;
    print_process_details(&details);

    runtime.shutdown();
    Ok(())
}
