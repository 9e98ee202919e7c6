use serde::Serialize;

/// One complete set of host metrics produced by a single collection call.
///
/// Field names serialize to the camelCase keys served by `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub time: String,
    /// 0 when no battery is present.
    pub battery: u8,
    pub cpu: f64,
    pub mem_used: u64,
    pub mem_total: u64,
    pub disk_total: String,
    pub disk_used: String,
    pub disk_avail: String,
    pub home_free: String,
    pub uptime: String,
    pub load: String,
    pub net: NetStat,
    pub procs: u64,
    /// 0 when no thermal zone is readable.
    pub temp: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetStat {
    pub iface: String,
    pub rx: f64,
    pub tx: f64,
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
