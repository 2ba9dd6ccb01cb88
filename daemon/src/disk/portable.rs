use super::{rank, DiskEntry, ScanStrategy};
use crate::error::DiskScanError;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Walks the tree in-process. Slower than `du` but works on any OS.
pub struct PortableScanner;

#[async_trait::async_trait]
impl ScanStrategy for PortableScanner {
    fn name(&self) -> &'static str {
        "portable"
    }

    async fn scan(&self, path: &Path, top_n: usize) -> Result<Vec<DiskEntry>, DiskScanError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || scan_blocking(&path, top_n))
            .await
            .map_err(|e| DiskScanError::Join(e.to_string()))?
    }
}

pub fn scan_blocking(path: &Path, top_n: usize) -> Result<Vec<DiskEntry>, DiskScanError> {
    let children = fs::read_dir(path).map_err(|source| DiskScanError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for child in children.flatten() {
        let child_path = child.path();
        // Follows symlinks, like a plain stat of the child would.
        let Ok(meta) = fs::metadata(&child_path) else {
            continue;
        };
        let size_bytes = if meta.is_dir() {
            dir_size(&child_path)
        } else if meta.is_file() {
            meta.len()
        } else {
            continue;
        };
        entries.push(DiskEntry {
            path: child_path,
            size_bytes,
        });
    }
    Ok(rank(entries, top_n))
}

/// Sum of every regular file under `dir`. Anything unreadable counts as 0.
pub fn dir_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| fs::metadata(entry.path()).ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}
