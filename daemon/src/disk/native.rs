use super::{rank, DiskEntry, ScanStrategy};
use crate::error::DiskScanError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Shells out to GNU `du`, one level deep. Fast, but Linux-only in practice.
pub struct NativeScanner {
    timeout: Duration,
}

impl NativeScanner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl ScanStrategy for NativeScanner {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn scan(&self, path: &Path, top_n: usize) -> Result<Vec<DiskEntry>, DiskScanError> {
        debug!("du scan of {:?}", path);
        let child = Command::new("du")
            .args(["-a", "-k", "--max-depth=1", "--"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DiskScanError::Spawn { command: "du", source })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DiskScanError::Timeout {
                command: "du",
                timeout: self.timeout,
            })?
            .map_err(|source| DiskScanError::Spawn { command: "du", source })?;

        if !output.status.success() {
            return Err(DiskScanError::CommandFailed {
                command: "du",
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(rank(parse_du_output(&stdout, path), top_n))
    }
}

/// Parses `du -k` lines (`<KiB>\t<path>`), dropping the total for `root`.
pub fn parse_du_output(stdout: &str, root: &Path) -> Vec<DiskEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let (size, entry_path) = line.split_once('\t')?;
            let kib: u64 = size.trim().parse().ok()?;
            let entry_path = PathBuf::from(entry_path.trim_end());
            if entry_path == root {
                return None;
            }
            Some(DiskEntry {
                path: entry_path,
                size_bytes: kib * 1024,
            })
        })
        .collect()
}
