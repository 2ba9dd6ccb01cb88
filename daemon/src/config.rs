//! Configuration management (TOML)

use crate::disk::StrategyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the text-generation credential.
pub const AI_KEY_ENV: &str = "SYSDASH_AI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub disk: DiskConfig,
    #[serde(default)]
    pub processes: ProcessConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub socket: SocketConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub sample_interval_secs: u64,
    pub sample_window_ms: u64,
    pub history_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
    pub root_mount: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root: Option<PathBuf>,
    pub top_n: usize,
    pub scan_timeout_secs: u64,
    pub search_cap: usize,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub limit: usize,
    pub cpu_window_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocketConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            sample_interval_secs: 300,
            sample_window_ms: 1000,
            history_hours: 24,
            retention_days: None,
            root_mount: PathBuf::from(if cfg!(windows) { "C:\\" } else { "/" }),
        }
    }
}

impl Default for DiskConfig {
    fn default() -> Self {
        DiskConfig {
            default_root: None,
            top_n: 10,
            scan_timeout_secs: 30,
            search_cap: 100,
            strategy: StrategyKind::Auto,
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        ProcessConfig {
            limit: 10,
            cpu_window_ms: 500,
        }
    }
}

impl GeneralConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs.max(1))
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_days
            .map(|days| Duration::from_secs(u64::from(days) * 86_400))
    }
}

impl DiskConfig {
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }

    /// Configured scan/search root, or the user's home directory.
    pub fn root(&self) -> PathBuf {
        self.default_root
            .clone()
            .or_else(crate::disk::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "sysdash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

/// Reads the text-generation credential once. Empty counts as unset.
pub fn ai_api_key() -> Option<String> {
    std::env::var(AI_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}
