pub mod cpu;
pub mod disk;
pub mod memory;
pub mod net;
pub mod procs;
pub mod system;

use crate::config::{Backend, Config};
use crate::snapshot::Snapshot;
use disk::{DfDiskUsage, DiskUsage, NativeDiskUsage};
use procs::{NativeProcessCount, ProcessCount, PsProcessCount};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Delay between the two `/proc/stat` samples used for CPU utilization.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unexpected content in {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Status { program: String, status: ExitStatus },
    #[error("no mounted filesystem contains {path}")]
    NoMount { path: String },
    #[error("collection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CollectError {
    pub(crate) fn parse(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String, CollectError> {
    std::fs::read_to_string(path).map_err(|source| CollectError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Locations of the kernel exposures the collector reads.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
    pub home_dir: PathBuf,
}

impl SourcePaths {
    pub fn uptime(&self) -> PathBuf {
        self.proc_root.join("uptime")
    }

    pub fn stat(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    pub fn meminfo(&self) -> PathBuf {
        self.proc_root.join("meminfo")
    }

    pub fn loadavg(&self) -> PathBuf {
        self.proc_root.join("loadavg")
    }

    pub fn net_dev(&self) -> PathBuf {
        self.proc_root.join("net").join("dev")
    }

    pub fn battery_capacity(&self) -> PathBuf {
        self.sys_root.join("class/power_supply/BAT0/capacity")
    }

    pub fn thermal_zone(&self) -> PathBuf {
        self.sys_root.join("class/thermal/thermal_zone0/temp")
    }
}

/// Produces a fresh [`Snapshot`] on every call. Holds configuration only.
#[derive(Clone)]
pub struct Collector {
    paths: SourcePaths,
    disk: Arc<dyn DiskUsage>,
    procs: Arc<dyn ProcessCount>,
    cpu_interval: Duration,
}

impl Collector {
    pub fn new(
        paths: SourcePaths,
        disk: Arc<dyn DiskUsage>,
        procs: Arc<dyn ProcessCount>,
    ) -> Self {
        Self {
            paths,
            disk,
            procs,
            cpu_interval: CPU_SAMPLE_INTERVAL,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let (disk, procs): (Arc<dyn DiskUsage>, Arc<dyn ProcessCount>) = match cfg.backend {
            Backend::External => (Arc::new(DfDiskUsage), Arc::new(PsProcessCount)),
            Backend::Native => (Arc::new(NativeDiskUsage), Arc::new(NativeProcessCount)),
        };
        Self::new(cfg.source_paths(), disk, procs)
    }

    pub async fn collect(&self) -> Result<Snapshot, CollectError> {
        let started = Instant::now();

        let cpu = cpu::sample_usage(&self.paths.stat(), self.cpu_interval).await?;

        let this = self.clone();
        let snapshot = tokio::task::spawn_blocking(move || this.assemble(cpu)).await??;

        debug!(
            elapsed = %humantime::format_duration(started.elapsed()),
            cpu = snapshot.cpu,
            procs = snapshot.procs,
            "snapshot collected"
        );
        Ok(snapshot)
    }

    fn assemble(&self, cpu: f64) -> Result<Snapshot, CollectError> {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        let battery = system::read_battery(&self.paths.battery_capacity());
        let mem = memory::read_memory(&self.paths.meminfo())?;
        let root = self.disk.usage(Path::new("/"))?;
        let home = self.disk.usage(&self.paths.home_dir)?;
        let uptime = system::format_uptime(system::read_uptime_seconds(&self.paths.uptime())?);
        let load = system::read_load(&self.paths.loadavg())?;
        let net = net::read_net(&self.paths.net_dev())?;
        let procs = self.procs.count()?;
        let temp = system::read_temperature(&self.paths.thermal_zone());

        Ok(Snapshot {
            time,
            battery,
            cpu,
            mem_used: mem.used_mb,
            mem_total: mem.total_mb,
            disk_total: root.total,
            disk_used: root.used,
            disk_avail: root.avail,
            home_free: home.avail,
            uptime,
            load,
            net,
            procs,
            temp,
        })
    }
}
