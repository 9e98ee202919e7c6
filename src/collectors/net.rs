use crate::collectors::{read_source, CollectError};
use crate::snapshot::{round1, NetStat};
use std::path::Path;

/// Counter columns after the interface name in `/proc/net/dev`.
const COUNTER_FIELDS: usize = 16;
const RX_BYTES: usize = 0;
const TX_BYTES: usize = 8;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Picks the first non-loopback interface. Header lines carry no `:` and are skipped.
pub fn parse_net_dev(text: &str) -> Result<NetStat, String> {
    for line in text.lines() {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name == "lo" {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < COUNTER_FIELDS {
            return Err(format!(
                "interface {name}: expected {COUNTER_FIELDS} counters, found {}",
                fields.len()
            ));
        }
        let rx = parse_counter(name, fields[RX_BYTES])?;
        let tx = parse_counter(name, fields[TX_BYTES])?;

        return Ok(NetStat {
            iface: name.to_string(),
            rx: bytes_to_mb(rx),
            tx: bytes_to_mb(tx),
        });
    }

    Ok(NetStat::default())
}

fn parse_counter(iface: &str, raw: &str) -> Result<u64, String> {
    raw.parse()
        .map_err(|_| format!("interface {iface}: bad counter {raw:?}"))
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round1(bytes as f64 / BYTES_PER_MB)
}

pub fn read_net(path: &Path) -> Result<NetStat, CollectError> {
    let text = read_source(path)?;
    parse_net_dev(&text).map_err(|reason| CollectError::parse(path, reason))
}
