//! Disk usage scanning: largest entries directly under a path

pub mod native;
pub mod portable;

use crate::error::DiskScanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use native::NativeScanner;
pub use portable::PortableScanner;

pub const DEFAULT_TOP_N: usize = 10;

/// One child of a scanned directory. Sizes stay in bytes until they reach
/// the JSON boundary, where [`format_size`] renders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl DiskEntry {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path.display().to_string(),
            "size": format_size(self.size_bytes),
            "size_bytes": self.size_bytes,
        })
    }
}

#[async_trait::async_trait]
pub trait ScanStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    async fn scan(&self, path: &Path, top_n: usize) -> Result<Vec<DiskEntry>, DiskScanError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Auto,
    Native,
    Portable,
}

impl StrategyKind {
    /// `Auto` becomes `Native` where GNU `du` is expected, `Portable` elsewhere.
    pub fn resolve(self) -> StrategyKind {
        match self {
            StrategyKind::Auto if cfg!(target_os = "linux") => StrategyKind::Native,
            StrategyKind::Auto => StrategyKind::Portable,
            other => other,
        }
    }
}

pub fn strategy_for(kind: StrategyKind, timeout: Duration) -> Box<dyn ScanStrategy> {
    match kind.resolve() {
        StrategyKind::Native => Box::new(NativeScanner::new(timeout)),
        _ => Box::new(PortableScanner),
    }
}

/// Largest first, at most `top_n`.
pub fn rank(mut entries: Vec<DiskEntry>, top_n: usize) -> Vec<DiskEntry> {
    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    entries.truncate(top_n);
    entries
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes > GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes > MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes > KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Expands a leading `~` and falls back to `default` when no path is given.
pub fn resolve_root(requested: Option<&str>, default: &Path) -> PathBuf {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return default.to_path_buf();
    };
    if raw == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
