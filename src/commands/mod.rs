// Command handlers module
pub mod config;
pub mod info;
pub mod kill;
pub mod monitor;
pub mod top;

// Re-exports for cleaner imports
pub use info::execute as info;
pub use kill::execute as kill;
pub use monitor::execute as monitor;
pub use top::execute as top;

use anyhow::{Context, Result};

use crate::core::Config;

/// Configuration file contents, validated before any engine starts
pub(crate) fn load_config() -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
