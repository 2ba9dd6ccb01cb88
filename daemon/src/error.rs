//! Error types for the dashboard core.
//!
//! Each subsystem gets its own enum so callers can tell a bad sample from a
//! failed scan without string matching.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// OS counters could not be read, or came back unusable.
#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("{counter} counter unavailable: {reason}")]
    Unavailable { counter: &'static str, reason: String },

    #[error("no mounted volume found for {mount:?}")]
    VolumeNotFound { mount: PathBuf },

    #[error("sampler task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("a sample already exists at timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: i64 },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot prepare database location {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DiskScanError {
    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: &'static str,
        status: String,
        stderr: String,
    },

    #[error("{command} did not finish within {timeout:?}")]
    Timeout { command: &'static str, timeout: Duration },

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan task failed: {0}")]
    Join(String),
}

impl DiskScanError {
    /// Diagnostic text for the `details` field of an error envelope.
    pub fn details(&self) -> Option<String> {
        match self {
            DiskScanError::CommandFailed { stderr, .. } => Some(stderr.clone()),
            DiskScanError::Spawn { source, .. } | DiskScanError::Unreadable { source, .. } => {
                Some(source.to_string())
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("cannot search {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("search task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("service listing is not supported on {os}")]
    UnsupportedPlatform { os: &'static str },

    #[error("systemctl exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("failed to run systemctl: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("systemctl did not finish within {timeout:?}")]
    Timeout { timeout: Duration },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("analysis is disabled: no text generation credentials configured")]
    Disabled,

    #[error("text generation failed: {0}")]
    Generation(String),
}
