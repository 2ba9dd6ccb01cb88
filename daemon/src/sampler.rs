//! Host metrics sampler (CPU, memory, root volume)

use crate::db::{MetricSample, MetricsStore};
use crate::error::SamplingError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::System;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub percent: f64,
}

/// Raw OS counters behind a sample.
pub trait HostCounters: Send {
    /// Blocks for `window` and returns the average utilization over it.
    fn cpu_percent(&mut self, window: Duration) -> Result<f64, SamplingError>;
    fn memory(&mut self) -> Result<CapacityUsage, SamplingError>;
    /// Usage of the volume mounted at (or containing) `mount`.
    fn disk(&mut self, mount: &Path) -> Result<CapacityUsage, SamplingError>;
}

/// A live reading: the persisted fields plus capacities in GiB.
///
/// `memory_used_gb` follows the kernel's notion of used memory (buffers and
/// page cache excluded), while `memory_percent` is the share that is not
/// available to new allocations. The two are close but not derived from
/// each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub timestamp: i64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_total_gb: f64,
    pub memory_used_gb: f64,
    pub disk_percent: f64,
    pub disk_total_gb: f64,
    pub disk_used_gb: f64,
}

impl From<LiveMetrics> for MetricSample {
    fn from(live: LiveMetrics) -> Self {
        MetricSample {
            timestamp: live.timestamp,
            cpu_percent: live.cpu_percent,
            memory_percent: live.memory_percent,
            disk_percent: live.disk_percent,
        }
    }
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    (bytes as f64 / GIB * 100.0).round() / 100.0
}

pub struct MetricsSampler<C: HostCounters> {
    counters: C,
    window: Duration,
    mount: PathBuf,
}

impl<C: HostCounters> MetricsSampler<C> {
    pub fn new(counters: C, window: Duration, mount: impl Into<PathBuf>) -> Self {
        Self {
            counters,
            window,
            mount: mount.into(),
        }
    }

    /// Blocks for the CPU observation window, then reads memory and disk.
    pub fn snapshot(&mut self) -> Result<LiveMetrics, SamplingError> {
        let cpu_percent = check_percent("cpu", self.counters.cpu_percent(self.window)?)?;
        let memory = self.counters.memory()?;
        let memory_percent = check_percent("memory", memory.percent)?;
        let disk = self.counters.disk(&self.mount)?;
        let disk_percent = check_percent("disk", disk.percent)?;

        Ok(LiveMetrics {
            timestamp: MetricsStore::now(),
            cpu_percent,
            memory_percent,
            memory_total_gb: bytes_to_gb(memory.total_bytes),
            memory_used_gb: bytes_to_gb(memory.used_bytes),
            disk_percent,
            disk_total_gb: bytes_to_gb(disk.total_bytes),
            disk_used_gb: bytes_to_gb(disk.used_bytes),
        })
    }

    pub fn sample(&mut self) -> Result<MetricSample, SamplingError> {
        self.snapshot().map(MetricSample::from)
    }
}

fn check_percent(counter: &'static str, value: f64) -> Result<f64, SamplingError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(SamplingError::Unavailable {
            counter,
            reason: format!("reported {value}"),
        })
    }
}

/// Counters read through `sysinfo`, except the volume, which comes from
/// `statvfs` on unix so reserved blocks are accounted for like `df` does.
pub struct SysinfoCounters {
    sys: System,
}

impl SysinfoCounters {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl Default for SysinfoCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCounters for SysinfoCounters {
    fn cpu_percent(&mut self, window: Duration) -> Result<f64, SamplingError> {
        self.sys.refresh_cpu_usage();
        std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.sys.refresh_cpu_usage();
        if self.sys.cpus().is_empty() {
            return Err(SamplingError::Unavailable {
                counter: "cpu",
                reason: "no CPUs reported".to_string(),
            });
        }
        Ok(f64::from(self.sys.global_cpu_usage()))
    }

    fn memory(&mut self) -> Result<CapacityUsage, SamplingError> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(SamplingError::Unavailable {
                counter: "memory",
                reason: "total memory reported as 0".to_string(),
            });
        }
        let unavailable = total.saturating_sub(self.sys.available_memory());
        #[cfg(target_os = "linux")]
        let used = std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|meminfo| meminfo_used_bytes(&meminfo))
            .unwrap_or(unavailable);
        #[cfg(not(target_os = "linux"))]
        let used = unavailable;
        Ok(CapacityUsage {
            total_bytes: total,
            used_bytes: used,
            percent: round1(unavailable as f64 / total as f64 * 100.0),
        })
    }

    fn disk(&mut self, mount: &Path) -> Result<CapacityUsage, SamplingError> {
        #[cfg(unix)]
        {
            statvfs_usage(mount)
        }
        #[cfg(not(unix))]
        {
            disks_usage(mount)
        }
    }
}

/// Volume usage as `df` reports it. Blocks reserved for root count as
/// neither used nor available, so `percent` is relative to
/// `used + available` rather than the raw capacity.
pub fn volume_usage(fragment_size: u64, blocks: u64, free: u64, available: u64) -> Option<CapacityUsage> {
    let total = blocks.saturating_mul(fragment_size);
    if total == 0 {
        return None;
    }
    let used = blocks.saturating_sub(free).saturating_mul(fragment_size);
    let usable = used.saturating_add(available.saturating_mul(fragment_size));
    let percent = if usable == 0 {
        0.0
    } else {
        round1(used as f64 / usable as f64 * 100.0)
    };
    Some(CapacityUsage {
        total_bytes: total,
        used_bytes: used,
        percent,
    })
}

#[cfg(unix)]
fn statvfs_usage(mount: &Path) -> Result<CapacityUsage, SamplingError> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(mount.as_os_str().as_bytes()).map_err(|_| SamplingError::VolumeNotFound {
        mount: mount.to_path_buf(),
    })?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    if unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) } != 0 {
        let err = std::io::Error::last_os_error();
        return Err(if err.kind() == std::io::ErrorKind::NotFound {
            SamplingError::VolumeNotFound {
                mount: mount.to_path_buf(),
            }
        } else {
            SamplingError::Unavailable {
                counter: "disk",
                reason: format!("statvfs {}: {}", mount.display(), err),
            }
        });
    }

    volume_usage(
        stat.f_frsize as u64,
        stat.f_blocks as u64,
        stat.f_bfree as u64,
        stat.f_bavail as u64,
    )
    .ok_or_else(|| SamplingError::Unavailable {
        counter: "disk",
        reason: format!("{} reports zero capacity", mount.display()),
    })
}

#[cfg(not(unix))]
fn disks_usage(mount: &Path) -> Result<CapacityUsage, SamplingError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    // Longest mount point that contains the requested path.
    let disk = disks
        .list()
        .iter()
        .filter(|d| mount.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .ok_or_else(|| SamplingError::VolumeNotFound {
            mount: mount.to_path_buf(),
        })?;

    let total = disk.total_space();
    if total == 0 {
        return Err(SamplingError::Unavailable {
            counter: "disk",
            reason: format!("{} reports zero capacity", disk.mount_point().display()),
        });
    }
    let used = total.saturating_sub(disk.available_space());
    Ok(CapacityUsage {
        total_bytes: total,
        used_bytes: used,
        percent: round1(used as f64 / total as f64 * 100.0),
    })
}

/// Used memory from `/proc/meminfo` text: `total - free - buffers - cached`,
/// where cached includes reclaimable slab. Falls back to `total - free` when
/// that goes negative, as it can inside containers.
pub fn meminfo_used_bytes(meminfo: &str) -> Option<u64> {
    let field = |key: &str| -> Option<u64> {
        meminfo.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?.strip_prefix(':')?;
            let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
            Some(kib * 1024)
        })
    };
    let total = field("MemTotal")?;
    let free = field("MemFree")?;
    let buffers = field("Buffers").unwrap_or(0);
    let cached = field("Cached").unwrap_or(0) + field("SReclaimable").unwrap_or(0);
    Some(
        total
            .checked_sub(free + buffers + cached)
            .unwrap_or_else(|| total.saturating_sub(free)),
    )
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
