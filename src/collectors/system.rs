use crate::collectors::{read_source, CollectError};
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn read_uptime_seconds(path: &Path) -> Result<f64, CollectError> {
    let text = read_source(path)?;
    text.split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| CollectError::parse(path, "expected seconds since boot"))
}

/// `1d 2h 3m`. Days and hours are dropped when zero; minutes are always present.
pub fn format_uptime(seconds: f64) -> String {
    let total = seconds as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{minutes}m"));
    parts.join(" ")
}

/// The 1, 5 and 15 minute averages, passed through as the kernel prints them.
pub fn parse_load(text: &str) -> Option<String> {
    let fields: Vec<&str> = text.split_whitespace().take(3).collect();
    if fields.len() != 3 || fields.iter().any(|f| f.parse::<f64>().is_err()) {
        return None;
    }
    Some(fields.join(" "))
}

pub fn read_load(path: &Path) -> Result<String, CollectError> {
    let text = read_source(path)?;
    parse_load(&text).ok_or_else(|| CollectError::parse(path, "expected three load averages"))
}

/// Capacity of the first battery, or 0 when there is none.
pub fn read_battery(path: &Path) -> u8 {
    if !path.exists() {
        return 0;
    }
    let parsed = fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|s| s.trim().parse::<u32>().map_err(|err| err.to_string()));
    match parsed {
        Ok(v) => v.min(100) as u8,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "battery capacity unreadable");
            0
        }
    }
}

/// Whole degrees Celsius from a millidegree thermal zone, 0 on any failure.
pub fn read_temperature(path: &Path) -> i64 {
    match fs::read_to_string(path) {
        Ok(raw) => match raw.trim().parse::<i64>() {
            Ok(millis) => millis / 1000,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "thermal zone malformed");
                0
            }
        },
        Err(err) => {
            debug!(path = %path.display(), error = %err, "thermal zone unreadable");
            0
        }
    }
}
