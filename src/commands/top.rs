use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::ArgMatches;

use crate::core::system_monitor::{EngineUpdate, MetricsRuntime, ProcessTable};
use crate::ui::print_process_table;

const POLL: Duration = Duration::from_millis(50);
const WAIT_LIMIT: Duration = Duration::from_secs(10);

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load_config()?;
    let limit = matches.get_one::<usize>("limit").copied().unwrap_or(20);
    let filter = matches.get_one::<String>("filter");

    let mut runtime = MetricsRuntime::new(&config).context("Failed to start metrics engine")?;

    // The first scan has no CPU baseline; the second one does
    let first = wait_for_table(&mut runtime)?;
    thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    runtime.force_update();
    let table = wait_for_table(&mut runtime).unwrap_or(first);

    let rows: Vec<_> = match filter {
        Some(query) => table.filter(query),
        None => table.processes.iter().collect(),
    };
    let rows: Vec<_> = rows.into_iter().take(limit).collect();

    print_process_table(&rows, table.total_seen);

    runtime.shutdown();
    Ok(())
}

fn wait_for_table(runtime: &mut MetricsRuntime) -> Result<Arc<ProcessTable>> {
    let deadline = Instant::now() + WAIT_LIMIT;

    while Instant::now() < deadline {
        let table = runtime.drain().into_iter().find_map(|update| match update {
            EngineUpdate::Processes(table) => Some(table),
            _ => None,
        });
        if let Some(table) = table {
            return Ok(table);
        }
        thread::sleep(POLL);
    }

    bail!("No process table within {} seconds", WAIT_LIMIT.as_secs())
}
