use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use syspulse::commands;

fn cli() -> Command {
    Command::new("syspulse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Continuous system metrics sampling with rolling history")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("monitor")
                .about("Stream live system metrics until Ctrl+C")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Sampling interval in milliseconds (overrides config)")
                        .value_parser(clap::value_parser!(u64).range(100..)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print each snapshot as a JSON line")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("ticks")
                        .short('n')
                        .long("ticks")
                        .value_name("N")
                        .help("Stop after N snapshots")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(
            Command::new("top")
                .about("Show the busiest processes")
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_name("N")
                        .help("Number of rows to print")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("20"),
                )
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("QUERY")
                        .help("Only show processes whose name or pid matches"),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show details for one process")
                .arg(
                    Arg::new("pid")
                        .help("Process id")
                        .required(true)
                        .value_parser(clap::value_parser!(u32))
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("kill")
                .about("Request termination of one or more processes")
                .arg(
                    Arg::new("pids")
                        .help("Process ids")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(u32))
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect the configuration file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the configuration file location"))
                .subcommand(Command::new("reset").about("Overwrite the file with defaults")),
        )
}

fn main() -> Result<()> {
    syspulse::init_logging();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor(sub_matches),
        Some(("top", sub_matches)) => commands::top(sub_matches),
        Some(("info", sub_matches)) => commands::info(sub_matches),
        Some(("kill", sub_matches)) => commands::kill(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        _ => {
            println!("Use 'syspulse --help' for more information.");
            Ok(())
        }
    }
}
