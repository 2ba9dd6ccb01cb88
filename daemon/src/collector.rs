//! Process snapshots for the top-processes listing

#[cfg(target_os = "linux")]
pub mod linux;
pub mod portable;

#[cfg(target_os = "linux")]
pub use linux::LinuxProcessCollector;
pub use portable::SysinfoProcessCollector;

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub username: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// CPU percentages are deltas between consecutive `list_processes` calls on
/// the same collector, so the first listing reports 0 for every process.
/// Processes that exit or refuse access mid-listing are left out.
pub trait ProcessCollector: Send + Sync {
    fn list_processes(&self) -> Vec<ProcessSnapshot>;
}

pub fn default_collector() -> Box<dyn ProcessCollector> {
    #[cfg(target_os = "linux")]
    {
        Box::new(LinuxProcessCollector::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(SysinfoProcessCollector::new())
    }
}

/// Busiest `n` processes by CPU, measured over `window`.
pub fn top_processes(collector: &dyn ProcessCollector, n: usize, window: Duration) -> Vec<ProcessSnapshot> {
    collector.list_processes();
    std::thread::sleep(window);
    let mut processes = collector.list_processes();
    processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    processes.truncate(n);
    processes
}
