//! CPU statistics collector.
//!
//! Core count comes from `/proc/cpuinfo`, per-core usage from the `cpuN` rows
//! of `/proc/stat` and load averages from `/proc/loadavg`.
//!
//! Per-core usage is a single-sample ratio of busy ticks to total ticks since
//! boot, not a rate over an interval. Callers that want current utilization
//! must take two snapshots and diff the counters themselves.

use tracing::debug;

use super::{parse_counter, parse_rows, RowPolicy};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::models::CpuStat;
use crate::reader::{read_lines, read_lines_window, LineWindow};
use crate::source::{HostSource, CPUINFO, LOADAVG, STAT};

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

/// Cumulative tick counters of one `cpuN` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CoreTicks {
    const NAMES: [&'static str; 10] = [
        "user",
        "nice",
        "system",
        "idle",
        "iowait",
        "irq",
        "softirq",
        "steal",
        "guest",
        "guest_nice",
    ];

    /// Parses the counter columns after the `cpuN` label.
    ///
    /// The first four (user, nice, system, idle) are required; older kernels
    /// omit the trailing ones, which then count as zero.
    fn parse(fields: &[&str]) -> Result<Self, String> {
        if fields.len() < 4 {
            return Err(format!(
                "expected at least 4 tick counters, got {}",
                fields.len()
            ));
        }

        let mut values = [0u64; 10];
        for (idx, field) in fields.iter().take(values.len()).enumerate() {
            values[idx] = parse_counter(field, Self::NAMES[idx])?;
        }

        Ok(Self {
            user: values[0],
            nice: values[1],
            system: values[2],
            idle: values[3],
            iowait: values[4],
            irq: values[5],
            softirq: values[6],
            steal: values[7],
            guest: values[8],
            guest_nice: values[9],
        })
    }

    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Non-busy time (idle + iowait).
    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Busy share of total ticks in percent, `None` when no ticks were counted.
    pub fn usage_percent(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let busy = total.saturating_sub(self.idle_total());
        Some((busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
    }
}

/// Collects core count, per-core usage and load averages.
///
/// Any failing sub-source fails the whole CPU domain.
pub fn collect_cpu(source: &dyn HostSource, budget: &Budget) -> Result<CpuStat, CollectError> {
    let cores = count_cores(source, budget)?;
    let per_cpu_usage = read_per_core_usage(source, cores, budget)?;
    let load = read_load_average(source, budget)?;

    if per_cpu_usage.len() != cores {
        debug!(
            "Parsed usage for {} of {} cores from {}",
            per_cpu_usage.len(),
            cores,
            source.display_path(STAT)
        );
    }

    Ok(CpuStat {
        cores,
        usage_percent: mean(&per_cpu_usage).clamp(0.0, 100.0),
        per_cpu_usage,
        load1: load.one_min,
        load5: load.five_min,
        load15: load.fifteen_min,
    })
}

/// Counts `processor` entries in `/proc/cpuinfo`.
pub fn count_cores(source: &dyn HostSource, budget: &Budget) -> Result<usize, CollectError> {
    let path = source.display_path(CPUINFO);
    let lines = read_lines(source, CPUINFO, budget)?;
    let cores = parse_rows(&lines, &path, RowPolicy::BestEffort, budget, |line| {
        Ok(is_processor_entry(line).then_some(()))
    })?
    .len();

    if cores == 0 {
        return Err(CollectError::parse(path, "no processor entries found"));
    }
    Ok(cores)
}

fn is_processor_entry(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(key, _)| key.trim() == "processor")
}

/// Reads the `cores` rows following the aggregate `cpu` row of `/proc/stat`.
pub fn read_per_core_usage(
    source: &dyn HostSource,
    cores: usize,
    budget: &Budget,
) -> Result<Vec<f64>, CollectError> {
    let path = source.display_path(STAT);
    let lines = read_lines_window(source, STAT, LineWindow::take(1, cores), budget)?;
    parse_per_core_usage(&lines, &path, budget)
}

pub(crate) fn parse_per_core_usage(
    lines: &[String],
    path: &str,
    budget: &Budget,
) -> Result<Vec<f64>, CollectError> {
    parse_rows(lines, path, RowPolicy::BestEffort, budget, parse_core_row)
}

fn parse_core_row(line: &str) -> Result<Option<f64>, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let label = match fields.first() {
        Some(label) => *label,
        None => return Err("empty row".to_string()),
    };

    if label == "cpu" {
        return Ok(None);
    }
    if !label.starts_with("cpu") {
        return Err(format!("unexpected row label {:?}", label));
    }

    let ticks = CoreTicks::parse(&fields[1..])?;
    match ticks.usage_percent() {
        Some(usage) => Ok(Some(usage)),
        None => {
            debug!("Skipping {} with zero ticks", label);
            Ok(None)
        }
    }
}

/// Reads load average from /proc/loadavg.
///
/// Format: "0.00 0.01 0.05 1/234 5678". Fewer than three numeric leading
/// fields is a parse error.
pub fn read_load_average(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<LoadAverage, CollectError> {
    let path = source.display_path(LOADAVG);
    let lines = read_lines_window(source, LOADAVG, LineWindow::take(0, 1), budget)?;
    let mut parsed = parse_rows(&lines, &path, RowPolicy::Strict, budget, |line| {
        parse_load_average_line(line).map(Some)
    })?;

    parsed
        .pop()
        .ok_or_else(|| CollectError::parse(path, "empty load average source"))
}

pub(crate) fn parse_load_average_line(line: &str) -> Result<LoadAverage, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!("expected at least 3 fields, got {}", parts.len()));
    }

    let one_min = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 1min load average: {}", e))?;
    let five_min = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 5min load average: {}", e))?;
    let fifteen_min = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 15min load average: {}", e))?;

    Ok(LoadAverage {
        one_min,
        five_min,
        fifteen_min,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
