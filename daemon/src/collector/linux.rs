use super::{ProcessCollector, ProcessSnapshot};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Clone)]
struct CpuSample {
    total_ticks: u64, // utime + stime
    timestamp: Instant,
}

/// Reads `/proc` directly.
pub struct LinuxProcessCollector {
    page_size: u64,
    clock_ticks: u64,
    mem_total_bytes: u64,
    users: HashMap<u32, String>,
    cpu_samples: Mutex<HashMap<u32, CpuSample>>,
}

impl LinuxProcessCollector {
    pub fn new() -> Self {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) as u64 };
        let clock_ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) as u64 }.max(1);
        Self {
            page_size,
            clock_ticks,
            mem_total_bytes: Self::get_mem_total(),
            users: Self::load_users(Path::new("/etc/passwd")),
            cpu_samples: Mutex::new(HashMap::new()),
        }
    }

    fn get_mem_total() -> u64 {
        let meminfo = fs::read_to_string("/proc/meminfo").unwrap_or_default();
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix("MemTotal:"))
            .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
            .map(|kib| kib * 1024)
            .unwrap_or(0)
    }

    /// uid -> login name, from a passwd-format file.
    pub fn load_users(passwd: &Path) -> HashMap<u32, String> {
        let content = fs::read_to_string(passwd).unwrap_or_default();
        content
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| {
                let mut fields = line.split(':');
                let name = fields.next()?;
                let uid = fields.nth(1)?.parse().ok()?;
                Some((uid, name.to_string()))
            })
            .collect()
    }

    fn read_uid(proc_dir: &Path) -> Option<u32> {
        let status = fs::read_to_string(proc_dir.join("status")).ok()?;
        status
            .lines()
            .find_map(|line| line.strip_prefix("Uid:"))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|uid| uid.parse().ok())
    }

    fn parse_process(&self, pid: u32) -> Option<ProcessSnapshot> {
        let proc_path = format!("/proc/{}", pid);
        let proc_dir = Path::new(&proc_path);

        let stat_content = fs::read_to_string(proc_dir.join("stat")).ok()?;
        // The command name sits in parentheses and may itself contain spaces.
        let open = stat_content.find('(')?;
        let close = stat_content.rfind(')')?;
        let name = stat_content.get(open + 1..close)?.to_string();
        let stat_parts: Vec<&str> = stat_content.get(close + 1..)?.split_whitespace().collect();
        if stat_parts.len() < 22 {
            return None;
        }

        // Offsets are relative to the field after the name (state = field 3).
        let utime: u64 = stat_parts[11].parse().unwrap_or(0);
        let stime: u64 = stat_parts[12].parse().unwrap_or(0);
        let rss_pages: u64 = stat_parts[21].parse().unwrap_or(0);

        let total_ticks = utime + stime;
        let now_instant = Instant::now();

        let cpu_percent = {
            let mut samples = self.cpu_samples.lock().unwrap_or_else(|p| p.into_inner());
            let percent = match samples.get(&pid) {
                Some(prev) => {
                    let tick_delta = total_ticks.saturating_sub(prev.total_ticks);
                    let time_delta = now_instant.duration_since(prev.timestamp).as_secs_f64();
                    if time_delta > 0.0 {
                        let cpu_seconds = tick_delta as f64 / self.clock_ticks as f64;
                        (cpu_seconds / time_delta) * 100.0
                    } else {
                        0.0
                    }
                }
                None => 0.0,
            };
            samples.insert(pid, CpuSample { total_ticks, timestamp: now_instant });
            percent
        };

        let memory_percent = if self.mem_total_bytes > 0 {
            (rss_pages * self.page_size) as f64 / self.mem_total_bytes as f64 * 100.0
        } else {
            0.0
        };

        let uid = Self::read_uid(proc_dir)?;
        let username = self
            .users
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string());

        Some(ProcessSnapshot {
            pid,
            name,
            username,
            cpu_percent,
            memory_percent,
        })
    }

    /// Remove stale CPU samples for processes that no longer exist
    pub fn cleanup_stale(&self, active_pids: &[u32]) {
        let mut samples = self.cpu_samples.lock().unwrap_or_else(|p| p.into_inner());
        samples.retain(|pid, _| active_pids.contains(pid));
    }
}

impl Default for LinuxProcessCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessCollector for LinuxProcessCollector {
    fn list_processes(&self) -> Vec<ProcessSnapshot> {
        let mut processes = Vec::new();
        if let Ok(entries) = fs::read_dir("/proc") {
            for entry in entries.flatten() {
                if let Some(name) = entry.file_name().to_str() {
                    if let Ok(pid) = name.parse::<u32>() {
                        if let Some(info) = self.parse_process(pid) {
                            processes.push(info);
                        }
                    }
                }
            }
        }
        let pids: Vec<u32> = processes.iter().map(|p| p.pid).collect();
        self.cleanup_stale(&pids);
        processes
    }
}
