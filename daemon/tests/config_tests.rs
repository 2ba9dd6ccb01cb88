use std::io::Write;
use std::path::PathBuf;
use sysdash_daemon::config::Config;
use sysdash_daemon::disk::StrategyKind;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.general.sample_interval_secs, 300);
    assert_eq!(config.general.sample_window_ms, 1000);
    assert_eq!(config.general.history_hours, 24);
    assert!(config.general.retention().is_none());
    assert_eq!(config.disk.top_n, 10);
    assert_eq!(config.disk.search_cap, 100);
    assert_eq!(config.disk.strategy, StrategyKind::Auto);
}

#[test]
fn test_load_from_toml() {
    let toml_content = r#"
[general]
sample_interval_secs = 60
retention_days = 30

[disk]
default_root = "/srv"
top_n = 5
strategy = "portable"
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.general.sample_interval_secs, 60);
    assert_eq!(config.general.retention().unwrap().as_secs(), 30 * 86_400);
    // Unspecified keys keep their defaults.
    assert_eq!(config.general.sample_window_ms, 1000);
    assert_eq!(config.disk.root(), PathBuf::from("/srv"));
    assert_eq!(config.disk.top_n, 5);
    assert_eq!(config.disk.strategy, StrategyKind::Portable);
    assert_eq!(config.processes.limit, 10);
}

#[test]
fn test_save_config() {
    let mut config = Config::default();
    config.general.retention_days = Some(7);
    config.disk.scan_timeout_secs = 5;
    let file = NamedTempFile::new().unwrap();
    config.save(file.path()).unwrap();
    let loaded = Config::load(file.path()).unwrap();
    assert_eq!(loaded.general.retention_days, Some(7));
    assert_eq!(loaded.disk.scan_timeout_secs, 5);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[general\nsample_interval_secs = ").unwrap();
    assert!(Config::load(file.path()).is_err());
}
