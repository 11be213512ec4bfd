//! System metrics snapshots.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, Networks, System};

use burrow_scan::{DiskUsage, Volume, is_listed_mount};

/// CPU details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub model: String,
    pub cores: usize,
    pub usage: f64,
}

/// Memory totals in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

/// Disk totals in bytes for the volume holding the home directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

/// Network counters since boot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// A point-in-time view of the machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub hostname: String,
    pub home_dir: PathBuf,
    pub os: String,
    pub uptime: String,
    pub version: String,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disk: DiskInfo,
    pub network: NetworkInfo,
    pub collected_at: DateTime<Local>,
}

/// Source of system metrics.
pub trait MetricsProvider: Send + Sync {
    /// Collect a fresh snapshot. May block briefly.
    fn snapshot(&self) -> SystemStatus;

    /// Disk totals used by the storage breakdown.
    fn disk_usage(&self) -> DiskUsage {
        let disk = self.snapshot().disk;
        DiskUsage {
            total: disk.total,
            used: disk.used,
            free: disk.free,
        }
    }

    /// Mounted volumes. None by default.
    fn volumes(&self) -> Vec<Volume> {
        Vec::new()
    }
}

/// [`MetricsProvider`] backed by `sysinfo`.
pub struct SysinfoMetrics {
    system: Mutex<System>,
    home_dir: PathBuf,
    version: String,
}

impl SysinfoMetrics {
    /// Create a provider reporting disk usage for the volume holding `home_dir`.
    pub fn new(home_dir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        let mut system = System::new();
        // CPU usage is a delta between two refreshes.
        system.refresh_cpu_usage();

        Self {
            system: Mutex::new(system),
            home_dir: home_dir.into(),
            version: version.into(),
        }
    }

    fn disk_info(&self) -> DiskInfo {
        let disks = Disks::new_with_refreshed_list();
        let volume = disks
            .list()
            .iter()
            .filter(|disk| self.home_dir.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len());

        match volume {
            Some(disk) => {
                let total = disk.total_space();
                let free = disk.available_space();
                let used = total.saturating_sub(free);
                DiskInfo {
                    total,
                    used,
                    free,
                    percent: percent(used, total),
                }
            }
            None => DiskInfo::default(),
        }
    }
}

impl MetricsProvider for SysinfoMetrics {
    fn snapshot(&self) -> SystemStatus {
        let (cpu, memory) = {
            let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
            system.refresh_cpu_all();
            system.refresh_memory();

            let cpu = CpuInfo {
                model: system
                    .cpus()
                    .first()
                    .map(|c| c.brand().trim().to_string())
                    .unwrap_or_default(),
                cores: system.cpus().len(),
                usage: f64::from(system.global_cpu_usage()),
            };
            let total = system.total_memory();
            let used = system.used_memory();
            let memory = MemoryInfo {
                total,
                used,
                available: system.available_memory(),
                percent: percent(used, total),
            };
            (cpu, memory)
        };

        let networks = Networks::new_with_refreshed_list();
        let network = networks.iter().fold(NetworkInfo::default(), |acc, (_, data)| NetworkInfo {
            bytes_sent: acc.bytes_sent + data.total_transmitted(),
            bytes_recv: acc.bytes_recv + data.total_received(),
        });

        SystemStatus {
            hostname: System::host_name().unwrap_or_default(),
            home_dir: self.home_dir.clone(),
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            uptime: format_uptime(System::uptime()),
            version: self.version.clone(),
            cpu,
            memory,
            disk: self.disk_info(),
            network,
            collected_at: Local::now(),
        }
    }

    fn volumes(&self) -> Vec<Volume> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| disk.total_space() > 0 && is_listed_mount(disk.mount_point()))
            .map(|disk| {
                Volume::new(
                    disk.name().to_string_lossy(),
                    disk.mount_point(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect()
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Format uptime seconds as `3d 4h 5m`, `4h 5m` or `5m`.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let mins = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

/// Fixed snapshot, for tests and headless runs.
#[derive(Debug, Clone)]
pub struct StaticMetrics {
    status: SystemStatus,
    volumes: Vec<Volume>,
}

impl StaticMetrics {
    /// A snapshot with the given home directory and disk totals.
    pub fn new(home_dir: &Path, disk: DiskUsage) -> Self {
        Self {
            status: SystemStatus {
                hostname: "localhost".to_string(),
                home_dir: home_dir.to_path_buf(),
                os: std::env::consts::OS.to_string(),
                uptime: format_uptime(0),
                version: env!("CARGO_PKG_VERSION").to_string(),
                cpu: CpuInfo::default(),
                memory: MemoryInfo::default(),
                disk: DiskInfo {
                    total: disk.total,
                    used: disk.used,
                    free: disk.free,
                    percent: percent(disk.used, disk.total),
                },
                network: NetworkInfo::default(),
                collected_at: Local::now(),
            },
            volumes: Vec::new(),
        }
    }

    /// Report `volumes` as the mounted volumes.
    pub fn with_volumes(mut self, volumes: Vec<Volume>) -> Self {
        self.volumes = volumes;
        self
    }
}

impl MetricsProvider for StaticMetrics {
    fn snapshot(&self) -> SystemStatus {
        SystemStatus {
            collected_at: Local::now(),
            ..self.status.clone()
        }
    }

    fn volumes(&self) -> Vec<Volume> {
        self.volumes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3_660), "1h 1m");
        assert_eq!(format_uptime(90_061), "1d 1h 1m");
    }

    #[test]
    fn test_static_disk_usage() {
        let disk = DiskUsage {
            total: 100,
            used: 40,
            free: 60,
        };
        let metrics = StaticMetrics::new(Path::new("/home/user"), disk);
        assert_eq!(metrics.disk_usage(), disk);
        assert_eq!(metrics.snapshot().disk.percent, 40.0);
    }
}
