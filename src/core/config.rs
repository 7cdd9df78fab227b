use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::system_monitor::{AlertConfig, DEFAULT_HISTORY_SIZE, DEFAULT_PROCESS_LIMIT};
use crate::error::MonitorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Period of the sampling loop
    pub sample_interval_ms: u64,
    /// Samples kept per metric history
    pub history_len: usize,
    pub process_interval_ms: u64,
    pub system_info_interval_ms: u64,
    /// Battery and temperature refresh period
    pub power_interval_ms: u64,
    /// Maximum rows in the process table
    pub process_limit: usize,
    /// Mount point whose space usage is sampled
    pub disk_mount: String,
    pub kill_timeout_ms: u64,
    pub alerts: AlertConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            history_len: DEFAULT_HISTORY_SIZE,
            process_interval_ms: 3000,
            system_info_interval_ms: 10_000,
            power_interval_ms: 30_000,
            process_limit: DEFAULT_PROCESS_LIMIT,
            disk_mount: default_disk_mount(),
            kill_timeout_ms: 5000,
            alerts: AlertConfig::default(),
        }
    }
}

fn default_disk_mount() -> String {
    if cfg!(windows) {
        "C:\\".to_string()
    } else {
        "/".to_string()
    }
}

impl Config {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.is_empty() {
            return Ok(Config::default());
        }

        // A file from an older layout or a hand edit gone wrong is not fatal
        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("syspulse").join("config.json"))
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        let intervals = [
            ("sample_interval_ms", self.sample_interval_ms),
            ("process_interval_ms", self.process_interval_ms),
            ("system_info_interval_ms", self.system_info_interval_ms),
            ("power_interval_ms", self.power_interval_ms),
            ("kill_timeout_ms", self.kill_timeout_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(MonitorError::config(format!("{} must be greater than 0", name)));
            }
        }
        if self.history_len == 0 {
            return Err(MonitorError::config("history_len must be greater than 0"));
        }
        if self.process_limit == 0 {
            return Err(MonitorError::config("process_limit must be greater than 0"));
        }
        if self.disk_mount.trim().is_empty() {
            return Err(MonitorError::config("disk_mount must not be empty"));
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn process_interval(&self) -> Duration {
        Duration::from_millis(self.process_interval_ms)
    }

    pub fn system_info_interval(&self) -> Duration {
        Duration::from_millis(self.system_info_interval_ms)
    }

    pub fn power_interval(&self) -> Duration {
        Duration::from_millis(self.power_interval_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }
}
