//! sysdash daemon: host metrics history, disk scans, process and service
//! listings for a local dashboard.

pub mod analysis;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod disk;
pub mod error;
pub mod protocol;
pub mod sampler;
pub mod scheduler;
pub mod search;
pub mod services;
#[cfg(unix)]
pub mod socket;
