use crate::collectors::CollectError;
use std::process::Command;
use sysinfo::{System, SystemExt};

pub trait ProcessCount: Send + Sync {
    fn count(&self) -> Result<u64, CollectError>;
}

/// Counts the rows of `ps -e --no-headers`.
pub struct PsProcessCount;

impl ProcessCount for PsProcessCount {
    fn count(&self) -> Result<u64, CollectError> {
        let output = Command::new("ps")
            .args(["-e", "--no-headers"])
            .output()
            .map_err(|source| CollectError::Spawn {
                program: "ps".to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(CollectError::Status {
                program: "ps".to_string(),
                status: output.status,
            });
        }
        Ok(count_rows(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub fn count_rows(text: &str) -> u64 {
    text.lines().filter(|l| !l.trim().is_empty()).count() as u64
}

/// Reads the process table through `sysinfo`.
pub struct NativeProcessCount;

impl ProcessCount for NativeProcessCount {
    fn count(&self) -> Result<u64, CollectError> {
        let mut system = System::new();
        system.refresh_processes();
        Ok(system.processes().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_non_empty_rows() {
        let text = "    1 ?        00:00:03 systemd\n    2 ?        00:00:00 kthreadd\n\n  811 pts/0    00:00:00 bash\n";
        assert_eq!(count_rows(text), 3);
        assert_eq!(count_rows(""), 0);
    }

    #[test]
    fn native_count_sees_this_process() {
        assert!(NativeProcessCount.count().unwrap() >= 1);
    }
}
