//! Snapshot data model.
//!
//! A [`Metrics`] value is built fresh for every collection call and is not
//! mutated after it is returned. Every field has a zero/empty default so that
//! a failed domain leaves a well-defined hole instead of garbage.

use serde::{Deserialize, Serialize};

/// One point-in-time view of host resource utilization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub host: String,
    /// RFC 3339 / ISO-8601 collection timestamp.
    pub update_timestamp: String,
    pub cpu: CpuStat,
    pub memory: MemoryStat,
    pub disk: Vec<DiskStat>,
    pub net: Vec<NetStat>,
}

/// CPU utilization and load.
///
/// `cores == 0` means the CPU domain failed for this snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuStat {
    pub cores: usize,
    /// Mean of `per_cpu_usage`, clamped to 0..=100.
    pub usage_percent: f64,
    /// Cumulative busy ratio since boot per logical core, in percent.
    pub per_cpu_usage: Vec<f64>,
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Physical memory and swap, all in bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStat {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub swap_used: u64,
    pub swap_used_percent: f64,
}

/// Capacity and cumulative I/O of one mounted whole-disk device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStat {
    pub mount_point: String,
    /// Kernel device name without the `/dev/` prefix, e.g. `sda`.
    pub device: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// Bytes available to unprivileged users.
    pub available: u64,
    pub used_percent: f64,
    pub inodes_total: u64,
    pub inodes_used: u64,
    pub inodes_free: u64,
    pub inodes_used_percent: f64,
    /// Completed read operations since boot.
    pub read: u64,
    /// Completed write operations since boot.
    pub write: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Cumulative counters of one network interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetStat {
    pub name: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
}
