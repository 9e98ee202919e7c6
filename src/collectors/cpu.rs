use crate::collectors::{read_source, CollectError};
use crate::snapshot::round1;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cumulative counters from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

pub fn parse_stat(text: &str) -> Option<CpuTimes> {
    let line = text.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = fields.map(|v| v.parse().ok()).collect::<Option<_>>()?;
    // user nice system idle ...
    let idle = *values.get(3)?;
    Some(CpuTimes {
        idle,
        total: values.iter().sum(),
    })
}

pub fn read_cpu_times(path: &Path) -> Result<CpuTimes, CollectError> {
    let text = read_source(path)?;
    parse_stat(&text).ok_or_else(|| CollectError::parse(path, "missing aggregate cpu line"))
}

/// Busy share of the interval between two samples, in percent with one decimal.
pub fn usage_between(prev: CpuTimes, next: CpuTimes) -> f64 {
    let total = next.total.saturating_sub(prev.total);
    if total == 0 {
        return 0.0;
    }
    let idle = next.idle.saturating_sub(prev.idle).min(total);
    round1(100.0 * (1.0 - idle as f64 / total as f64))
}

/// Takes two samples `interval` apart. The task is suspended, not the worker thread,
/// and both reads run on the blocking pool like the other readers.
pub async fn sample_usage(path: &Path, interval: Duration) -> Result<f64, CollectError> {
    let first = read_cpu_times_blocking(path.to_path_buf()).await?;
    tokio::time::sleep(interval).await;
    let second = read_cpu_times_blocking(path.to_path_buf()).await?;
    Ok(usage_between(first, second))
}

async fn read_cpu_times_blocking(path: PathBuf) -> Result<CpuTimes, CollectError> {
    tokio::task::spawn_blocking(move || read_cpu_times(&path)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregate_line() {
        let times = parse_stat(crate::collectors::testing::STAT).unwrap();
        assert_eq!(times.idle, 3699);
        assert_eq!(times.total, 4705 + 356 + 584 + 3699 + 23 + 23);
    }

    #[test]
    fn rejects_per_core_first_line() {
        assert!(parse_stat("cpu0 1 2 3 4 5\n").is_none());
        assert!(parse_stat("cpu 1 2 3\n").is_none());
        assert!(parse_stat("").is_none());
    }

    #[test]
    fn usage_from_deltas() {
        let a = CpuTimes {
            idle: 1000,
            total: 2000,
        };
        let b = CpuTimes {
            idle: 1150,
            total: 2200,
        };
        assert_eq!(usage_between(a, b), 25.0);
    }

    #[test]
    fn usage_rounds_to_one_decimal() {
        let a = CpuTimes { idle: 0, total: 0 };
        let b = CpuTimes { idle: 2, total: 3 };
        assert_eq!(usage_between(a, b), 33.3);
    }

    #[test]
    fn usage_is_bounded_for_non_decreasing_samples() {
        let base = CpuTimes {
            idle: 500,
            total: 900,
        };
        for idle_delta in [0_u64, 1, 7, 50, 99, 100] {
            for extra in [0_u64, 1, 13, 400] {
                let next = CpuTimes {
                    idle: base.idle + idle_delta,
                    total: base.total + idle_delta + extra,
                };
                let usage = usage_between(base, next);
                assert!((0.0..=100.0).contains(&usage), "{usage}");
            }
        }
    }

    #[test]
    fn idle_machine_and_busy_machine() {
        let a = CpuTimes {
            idle: 10,
            total: 20,
        };
        assert_eq!(
            usage_between(a, CpuTimes { idle: 110, total: 120 }),
            0.0
        );
        assert_eq!(
            usage_between(a, CpuTimes { idle: 10, total: 120 }),
            100.0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sampling_waits_between_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");
        std::fs::write(&path, crate::collectors::testing::STAT).unwrap();

        let started = tokio::time::Instant::now();
        let usage = sample_usage(&path, Duration::from_millis(500)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(usage, 0.0);
    }

    #[tokio::test]
    async fn sampling_missing_stat_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sample_usage(&dir.path().join("stat"), Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectError::Read { .. }));
    }

    #[test]
    fn zero_interval_reports_zero() {
        let a = CpuTimes {
            idle: 10,
            total: 20,
        };
        assert_eq!(usage_between(a, a), 0.0);
    }
}
