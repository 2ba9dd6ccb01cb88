use std::fs;
use std::path::Path;
use std::time::Duration;
use sysdash_daemon::disk::{format_size, strategy_for, PortableScanner, ScanStrategy, StrategyKind};
use sysdash_daemon::error::DiskScanError;
use tempfile::tempdir;

fn write_file(path: &Path, len: usize) {
    fs::write(path, vec![b'x'; len]).unwrap();
}

#[tokio::test]
async fn test_portable_file_ranks_above_empty_dir() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("data.bin"), 2048);
    fs::create_dir(dir.path().join("empty")).unwrap();

    let entries = PortableScanner.scan(dir.path(), 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, dir.path().join("data.bin"));
    assert_eq!(format_size(entries[0].size_bytes), "2.00 KB");
    assert_eq!(entries[1].path, dir.path().join("empty"));
    assert_eq!(format_size(entries[1].size_bytes), "0 B");
}

#[tokio::test]
async fn test_portable_sums_nested_directories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("big").join("deeper");
    fs::create_dir_all(&nested).unwrap();
    write_file(&dir.path().join("big").join("a"), 1000);
    write_file(&nested.join("b"), 3000);
    write_file(&dir.path().join("small"), 10);

    let entries = PortableScanner.scan(dir.path(), 10).await.unwrap();
    assert_eq!(entries[0].path, dir.path().join("big"));
    assert_eq!(entries[0].size_bytes, 4000);
    assert_eq!(entries[1].size_bytes, 10);
}

#[tokio::test]
async fn test_portable_respects_top_n() {
    let dir = tempdir().unwrap();
    for i in 0..15 {
        write_file(&dir.path().join(format!("f{i}")), i * 100);
    }
    let entries = PortableScanner.scan(dir.path(), 4).await.unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.windows(2).all(|w| w[0].size_bytes >= w[1].size_bytes));
    assert_eq!(entries[0].size_bytes, 1400);
}

#[tokio::test]
async fn test_portable_missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let err = PortableScanner.scan(&dir.path().join("nope"), 10).await.unwrap_err();
    assert!(matches!(err, DiskScanError::Unreadable { .. }));
}

#[test]
fn test_strategy_selection() {
    let timeout = Duration::from_secs(1);
    assert_eq!(strategy_for(StrategyKind::Portable, timeout).name(), "portable");
    assert_eq!(strategy_for(StrategyKind::Native, timeout).name(), "native");
    let expected = if cfg!(target_os = "linux") { "native" } else { "portable" };
    assert_eq!(strategy_for(StrategyKind::Auto, timeout).name(), expected);
}

#[cfg(target_os = "linux")]
mod native {
    use super::write_file;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use sysdash_daemon::disk::{NativeScanner, ScanStrategy};
    use sysdash_daemon::error::DiskScanError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_native_lists_children_largest_first() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        write_file(&dir.path().join("sub").join("payload"), 64 * 1024);
        write_file(&dir.path().join("tiny"), 1);

        let entries = NativeScanner::new(Duration::from_secs(30))
            .scan(dir.path(), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, dir.path().join("sub"));
        assert!(entries[0].size_bytes >= entries[1].size_bytes);
        assert!(entries.iter().all(|e| e.path != dir.path()));
    }

    #[tokio::test]
    async fn test_native_failure_carries_diagnostics() {
        let dir = tempdir().unwrap();
        let err = NativeScanner::new(Duration::from_secs(30))
            .scan(&dir.path().join("missing"), 10)
            .await
            .unwrap_err();
        match err {
            DiskScanError::CommandFailed { stderr, .. } => assert!(!stderr.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }
    #[tokio::test]
    async fn test_native_times_out() {
        let err = NativeScanner::new(Duration::from_millis(1))
            .scan(Path::new("/usr"), 10)
            .await
            .unwrap_err();
        match &err {
            DiskScanError::Timeout { command, timeout } => {
                assert_eq!(*command, "du");
                assert_eq!(*timeout, Duration::from_millis(1));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Sub-second limits must not render as "0s".
        assert!(err.to_string().contains("1ms"), "{err}");
    }
}
