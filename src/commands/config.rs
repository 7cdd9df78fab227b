use crate::core::Config;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => show(),
        Some(("path", _)) => path(),
        Some(("reset", _)) => reset(),
        _ => {
            println!("Use 'syspulse config --help' for more information.");
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let config = Config::load()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("{}", json);

    if let Err(e) = config.validate() {
        println!("{}", format!("⚠️  {}", e).yellow());
    }
    Ok(())
}

fn path() -> Result<()> {
    let config_path = Config::get_config_path()?;
    println!("{}", config_path.display().to_string().cyan().bold());
    if !config_path.exists() {
        println!("{}", "(file not created yet, defaults in use)".dimmed());
    }
    Ok(())
}

fn reset() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!(
        "{} {}",
        "✓ Configuration reset to defaults:".green(),
        Config::get_config_path()?.display()
    );
    Ok(())
}
