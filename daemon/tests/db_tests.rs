use sysdash_daemon::db::{MetricSample, MetricsStore};
use sysdash_daemon::error::StoreError;
use tempfile::tempdir;

fn sample(timestamp: i64, cpu: f64) -> MetricSample {
    MetricSample {
        timestamp,
        cpu_percent: cpu,
        memory_percent: 50.0,
        disk_percent: 70.0,
    }
}

#[test]
fn test_create_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("test.db");
    let db = MetricsStore::open(&db_path).unwrap();
    db.init_schema().unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_init_schema_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    db.insert(&sample(100, 1.0)).unwrap();
    db.init_schema().unwrap();
    assert_eq!(db.count().unwrap(), 1);
}

#[test]
fn test_query_range_is_ordered_and_bounded() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    for (i, ts) in [100, 200, 300, 400, 500].iter().enumerate() {
        db.insert(&sample(*ts, i as f64)).unwrap();
    }

    let all = db.query_range(0, 1000).unwrap();
    assert_eq!(all.iter().map(|s| s.timestamp).collect::<Vec<_>>(), vec![100, 200, 300, 400, 500]);

    let window = db.query_range(200, 400).unwrap();
    assert_eq!(window.iter().map(|s| s.timestamp).collect::<Vec<_>>(), vec![200, 300, 400]);
    assert_eq!(window[0], sample(200, 1.0));

    assert!(db.query_range(501, 1000).unwrap().is_empty());
}

#[test]
fn test_duplicate_timestamp_is_rejected() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    db.insert(&sample(1_700_000_000, 10.0)).unwrap();

    let err = db.insert(&sample(1_700_000_000, 99.0)).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateTimestamp { timestamp: 1_700_000_000 }));

    let rows = db.query_range(1_700_000_000, 1_700_000_000).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cpu_percent, 10.0);
}

#[test]
fn test_null_field_is_not_reported_as_duplicate() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();

    // SQLite stores NaN as NULL, which trips NOT NULL rather than the key.
    let err = db.insert(&sample(1_700_000_000, f64::NAN)).unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)), "{err}");
    assert_eq!(db.count().unwrap(), 0);
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    {
        let db = MetricsStore::open(&db_path).unwrap();
        db.init_schema().unwrap();
        db.insert(&sample(42, 5.0)).unwrap();
    }
    let db = MetricsStore::open(&db_path).unwrap();
    db.init_schema().unwrap();
    assert_eq!(db.query_range(0, 100).unwrap(), vec![sample(42, 5.0)]);
}

#[test]
fn test_recent_covers_lookback_window() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    let now = MetricsStore::now();
    db.insert(&sample(now - 25 * 3600, 1.0)).unwrap();
    db.insert(&sample(now - 3600, 2.0)).unwrap();

    let recent = db.recent(24).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].cpu_percent, 2.0);
}

#[test]
fn test_prune_before_removes_only_older_rows() {
    let dir = tempdir().unwrap();
    let db = MetricsStore::open(&dir.path().join("test.db")).unwrap();
    db.init_schema().unwrap();
    for ts in [10, 20, 30] {
        db.insert(&sample(ts, 0.0)).unwrap();
    }
    assert_eq!(db.prune_before(20).unwrap(), 1);
    assert_eq!(db.query_range(0, 100).unwrap().len(), 2);
    assert_eq!(db.prune_before(20).unwrap(), 0);
}
