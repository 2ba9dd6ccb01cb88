use super::{ProcessCollector, ProcessSnapshot};
use std::sync::Mutex;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};

/// Cross-platform collector backed by `sysinfo`.
pub struct SysinfoProcessCollector {
    sys: Mutex<System>,
    users: Users,
}

impl SysinfoProcessCollector {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self {
            sys: Mutex::new(sys),
            users: Users::new_with_refreshed_list(),
        }
    }

    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_user(UpdateKind::OnlyIfNotSet)
    }

    fn snapshot(&self, pid: Pid, process: &Process, total_memory: u64) -> ProcessSnapshot {
        let username = process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .unwrap_or_default();
        let memory_percent = if total_memory > 0 {
            process.memory() as f64 / total_memory as f64 * 100.0
        } else {
            0.0
        };
        ProcessSnapshot {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().to_string(),
            username,
            cpu_percent: f64::from(process.cpu_usage()),
            memory_percent,
        }
    }
}

impl Default for SysinfoProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector for SysinfoProcessCollector {
    fn list_processes(&self) -> Vec<ProcessSnapshot> {
        let mut sys = self.sys.lock().unwrap_or_else(|p| p.into_inner());
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, Self::refresh_kind());
        let total_memory = sys.total_memory();
        sys.processes()
            .iter()
            .map(|(pid, process)| self.snapshot(*pid, process, total_memory))
            .collect()
    }
}
