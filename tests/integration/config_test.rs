use std::fs;

use syspulse::core::config::Config;
use syspulse::core::system_monitor::AlertConfig;
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.sample_interval_ms, 1000);
    assert_eq!(config.process_interval_ms, 3000);
    assert_eq!(config.system_info_interval_ms, 10_000);
    assert_eq!(config.kill_timeout_ms, 5000);
    assert_eq!(config.alerts, AlertConfig::default());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        sample_interval_ms: 250,
        history_len: 120,
        disk_mount: "/data".to_string(),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_load_nonexistent_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("missing.json")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_config_empty_or_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();

    let empty = temp_dir.path().join("empty.json");
    fs::write(&empty, "").unwrap();
    assert_eq!(Config::load_from(&empty).unwrap(), Config::default());

    let corrupt = temp_dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert_eq!(Config::load_from(&corrupt).unwrap(), Config::default());
}

#[test]
fn test_config_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{"process_limit": 50, "alerts": {"cpu_critical": 99.0}}"#).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.process_limit, 50);
    assert_eq!(loaded.alerts.cpu_critical, 99.0);
    assert_eq!(loaded.alerts.cpu_warning, AlertConfig::default().cpu_warning);
    assert_eq!(loaded.history_len, 60);
}
