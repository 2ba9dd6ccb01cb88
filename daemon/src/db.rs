//! SQLite metrics store

use crate::error::StoreError;
use rusqlite::{ffi, params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One timestamped CPU/memory/disk reading. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: i64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

/// Append-only metrics table.
///
/// Inserts go through one writer connection held behind a mutex. Range
/// queries open their own read-only connection, so with WAL journaling a
/// reader never waits on the scheduler's insert.
pub struct MetricsStore {
    path: PathBuf,
    writer: Mutex<Connection>,
}

impl MetricsStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(conn),
        })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "sysdash")
            .map(|dirs| dirs.data_dir().join("metrics.db"))
            .unwrap_or_else(|| PathBuf::from("metrics.db"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the table if missing. Safe to call any number of times.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.writer().execute_batch(include_str!("../schema.sql"))?;
        Ok(())
    }

    pub fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    pub fn insert(&self, sample: &MetricSample) -> Result<(), StoreError> {
        let result = self.writer().execute(
            "INSERT INTO metrics (timestamp, cpu_percent, memory_percent, disk_percent) VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.timestamp,
                sample.cpu_percent,
                sample.memory_percent,
                sample.disk_percent
            ],
        );
        match result {
            Ok(_) => Ok(()),
            // Only the primary key is a duplicate; NOT NULL failures (NaN binds as NULL) are not.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StoreError::DuplicateTimestamp {
                    timestamp: sample.timestamp,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Samples with `since <= timestamp <= until`, oldest first.
    pub fn query_range(&self, since: i64, until: i64) -> Result<Vec<MetricSample>, StoreError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, cpu_percent, memory_percent, disk_percent
             FROM metrics WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map(params![since, until], Self::map_sample)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The last `hours` of history, ending now.
    pub fn recent(&self, hours: u32) -> Result<Vec<MetricSample>, StoreError> {
        let now = Self::now();
        self.query_range(now - i64::from(hours) * 3600, now)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .writer()
            .query_row("SELECT COUNT(*) FROM metrics", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Deletes samples strictly older than `cutoff`. Returns rows removed.
    pub fn prune_before(&self, cutoff: i64) -> Result<usize, StoreError> {
        let removed = self
            .writer()
            .execute("DELETE FROM metrics WHERE timestamp < ?1", params![cutoff])?;
        Ok(removed)
    }

    fn map_sample(row: &rusqlite::Row) -> rusqlite::Result<MetricSample> {
        Ok(MetricSample {
            timestamp: row.get(0)?,
            cpu_percent: row.get(1)?,
            memory_percent: row.get(2)?,
            disk_percent: row.get(3)?,
        })
    }

    fn writer(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection itself intact.
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
