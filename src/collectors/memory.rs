use crate::collectors::{read_source, CollectError};
use std::collections::HashMap;
use std::path::Path;

/// Memory figures in megabytes. `used_mb + available_mb == total_mb` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStat {
    pub total_mb: u64,
    pub available_mb: u64,
    pub used_mb: u64,
}

fn parse_meminfo_kb(text: &str) -> HashMap<&str, u64> {
    text.lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let value = rest.split_whitespace().next()?.parse().ok()?;
            Some((key.trim(), value))
        })
        .collect()
}

pub fn parse_memory(text: &str) -> Result<MemoryStat, String> {
    let table = parse_meminfo_kb(text);
    let total_kb = *table.get("MemTotal").ok_or("MemTotal not found")?;
    let available_kb = *table.get("MemAvailable").ok_or("MemAvailable not found")?;

    let total_mb = total_kb / 1024;
    let available_mb = (available_kb / 1024).min(total_mb);
    Ok(MemoryStat {
        total_mb,
        available_mb,
        used_mb: total_mb - available_mb,
    })
}

pub fn read_memory(path: &Path) -> Result<MemoryStat, CollectError> {
    let text = read_source(path)?;
    parse_memory(&text).map_err(|reason| CollectError::parse(path, reason))
}
