use crate::collectors::CollectError;
use std::path::Path;
use std::process::Command;
use sysinfo::{DiskExt, System, SystemExt};

/// Human-readable sizes of the filesystem holding a path, `df -h` style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: String,
    pub used: String,
    pub avail: String,
}

pub trait DiskUsage: Send + Sync {
    fn usage(&self, path: &Path) -> Result<DiskSpace, CollectError>;
}

/// Runs `df -hP` and reads the size columns verbatim.
pub struct DfDiskUsage;

impl DiskUsage for DfDiskUsage {
    fn usage(&self, path: &Path) -> Result<DiskSpace, CollectError> {
        let output = Command::new("df")
            .arg("-hP")
            .arg(path)
            .output()
            .map_err(|source| CollectError::Spawn {
                program: "df".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(CollectError::Status {
                program: "df".to_string(),
                status: output.status,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        parse_df(&text).ok_or_else(|| {
            CollectError::parse(path, format!("unexpected df output: {:?}", text.trim()))
        })
    }
}

/// Columns: Filesystem Size Used Avail Capacity Mounted-on. Only the last line is used.
pub fn parse_df(text: &str) -> Option<DiskSpace> {
    let line = text.lines().rev().find(|l| !l.trim().is_empty())?;
    let cols: Vec<&str> = line.split_whitespace().collect();
    if cols.len() < 4 || cols[0] == "Filesystem" {
        return None;
    }
    Some(DiskSpace {
        total: cols[1].to_string(),
        used: cols[2].to_string(),
        avail: cols[3].to_string(),
    })
}

/// Reads the mount table through `sysinfo` instead of spawning `df`.
pub struct NativeDiskUsage;

impl DiskUsage for NativeDiskUsage {
    fn usage(&self, path: &Path) -> Result<DiskSpace, CollectError> {
        let target = path.canonicalize().map_err(|source| CollectError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut system = System::new();
        system.refresh_disks_list();
        system.refresh_disks();

        let disk = system
            .disks()
            .iter()
            .filter(|d| target.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .ok_or_else(|| CollectError::NoMount {
                path: target.display().to_string(),
            })?;

        let total = disk.total_space();
        let avail = disk.available_space();
        Ok(DiskSpace {
            total: human_size(total),
            used: human_size(total.saturating_sub(avail)),
            avail: human_size(avail),
        })
    }
}

/// Formats bytes the way `df -h` does: powers of 1024, rounded up, one decimal below 10.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

    if bytes < 1024 {
        return bytes.to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    loop {
        value /= 1024.0;
        let shown = if value < 10.0 {
            (value * 10.0).ceil() / 10.0
        } else {
            value.ceil()
        };
        if shown < 1024.0 || unit == UNITS.len() - 1 {
            return if shown < 10.0 {
                format!("{shown:.1}{}", UNITS[unit])
            } else {
                format!("{shown:.0}{}", UNITS[unit])
            };
        }
        unit += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_posix_df_output() {
        let text = "Filesystem      Size  Used Avail Capacity Mounted on\n\
/dev/nvme0n1p2  234G   98G  124G      45% /\n";
        let space = parse_df(text).unwrap();
        assert_eq!(
            space,
            DiskSpace {
                total: "234G".to_string(),
                used: "98G".to_string(),
                avail: "124G".to_string(),
            }
        );
    }

    #[test]
    fn header_only_output_is_rejected() {
        assert!(parse_df("Filesystem Size Used Avail Capacity Mounted on\n").is_none());
        assert!(parse_df("").is_none());
        assert!(parse_df("/dev/sda1 10G\n").is_none());
    }

    #[test]
    fn human_size_matches_df() {
        assert_eq!(human_size(0), "0");
        assert_eq!(human_size(512), "512");
        assert_eq!(human_size(1024), "1.0K");
        assert_eq!(human_size(1536), "1.5K");
        assert_eq!(human_size(10 * 1024 * 1024), "10M");
        assert_eq!(human_size(120 * 1024 * 1024 * 1024), "120G");
        assert_eq!(human_size(9 * 1024 * 1024 * 1024 + 1), "9.1G");
        assert_eq!(human_size(1023 * 1024 + 1), "1.0M");
    }

    #[test]
    fn human_size_rounds_up() {
        assert_eq!(human_size(120 * 1024 * 1024 * 1024 + 1), "121G");
    }

    #[test]
    fn df_failure_on_missing_path_is_an_error() {
        let err = DfDiskUsage
            .usage(Path::new("/nonexistent/linux-watch/home"))
            .unwrap_err();
        // Hosts without `df` fail to spawn instead of exiting non-zero.
        assert!(
            matches!(err, CollectError::Status { ref program, .. } if program == "df")
                || matches!(err, CollectError::Spawn { .. }),
            "{err}"
        );
    }

    #[test]
    fn native_backend_finds_root_mount() {
        // Containers may hide the mount table; only assert on success.
        if let Ok(space) = NativeDiskUsage.usage(Path::new("/")) {
            assert!(!space.total.is_empty());
            assert!(!space.avail.is_empty());
        }
    }
}
