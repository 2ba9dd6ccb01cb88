//! Bounded filename search

use crate::error::SearchError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_CAP: usize = 100;

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn name_matches(path: &Path, needle: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Case-insensitive substring search over file and directory names under
/// `root`. Hidden directories are never entered or matched, and the walk
/// stops as soon as `cap` matches are found.
///
/// Walk order is top-down per directory: every file name in a directory is
/// checked, then its subdirectory names, before any subdirectory is entered.
/// Which matches survive the cap depends on this order.
pub fn search(query: &str, root: &Path, cap: usize) -> Result<Vec<PathBuf>, SearchError> {
    std::fs::read_dir(root).map_err(|source| SearchError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let needle = query.to_lowercase();
    let mut matches = Vec::new();
    if cap == 0 {
        return Ok(matches);
    }

    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        // Unreadable subdirectories are skipped.
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).into_iter().filter_map(|e| e.ok()) {
            let is_dir = entry.file_type().is_dir();
            let path = entry.into_path();
            if is_dir {
                if !is_hidden(&path) {
                    dirs.push(path);
                }
            } else {
                files.push(path);
            }
        }

        for path in files.iter().chain(&dirs) {
            if name_matches(path, &needle) {
                matches.push(path.clone());
                if matches.len() >= cap {
                    return Ok(matches);
                }
            }
        }
        pending.extend(dirs.into_iter().rev());
    }
    Ok(matches)
}

pub async fn search_async(query: String, root: PathBuf, cap: usize) -> Result<Vec<PathBuf>, SearchError> {
    tokio::task::spawn_blocking(move || search(&query, &root, cap))
        .await
        .map_err(|e| SearchError::Join(e.to_string()))?
}
