//! Memory statistics collector.
//!
//! Parses `/proc/meminfo` key/value rows. Values are in kibibytes and are
//! converted to bytes. A malformed value on any recognized key fails the whole
//! memory domain; unrecognized keys are ignored.

use super::{parse_counter, parse_rows, RowPolicy};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::models::MemoryStat;
use crate::reader::read_lines;
use crate::source::{HostSource, MEMINFO};
use crate::units::{kib_to_bytes, pct};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemKey {
    MemTotal,
    MemFree,
    MemAvailable,
    SwapTotal,
    SwapFree,
    Buffers,
    Cached,
}

impl MemKey {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "MemTotal" => Some(MemKey::MemTotal),
            "MemFree" => Some(MemKey::MemFree),
            "MemAvailable" => Some(MemKey::MemAvailable),
            "SwapTotal" => Some(MemKey::SwapTotal),
            "SwapFree" => Some(MemKey::SwapFree),
            "Buffers" => Some(MemKey::Buffers),
            "Cached" => Some(MemKey::Cached),
            _ => None,
        }
    }
}

/// Raw `/proc/meminfo` figures in bytes.
///
/// `available` stays `None` on kernels older than 3.14, which lack MemAvailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total: u64,
    pub free: u64,
    pub available: Option<u64>,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

impl MemInfo {
    fn set(&mut self, key: MemKey, bytes: u64) {
        match key {
            MemKey::MemTotal => self.total = bytes,
            MemKey::MemFree => self.free = bytes,
            MemKey::MemAvailable => self.available = Some(bytes),
            MemKey::SwapTotal => self.swap_total = bytes,
            MemKey::SwapFree => self.swap_free = bytes,
            MemKey::Buffers => self.buffers = bytes,
            MemKey::Cached => self.cached = bytes,
        }
    }

    /// Derives used/percent figures.
    ///
    /// With MemAvailable: `used = total - available`. Without it:
    /// `used = total - free - buffers - cached`, floored at zero.
    pub fn to_stat(&self) -> MemoryStat {
        let (used, available) = match self.available {
            Some(available) => (self.total.saturating_sub(available), available),
            None => {
                let used = self
                    .total
                    .saturating_sub(self.free)
                    .saturating_sub(self.buffers)
                    .saturating_sub(self.cached);
                (used, self.total - used)
            }
        };

        // An inconsistent source (free > total) leaves swap usage at zero.
        let (swap_used, swap_used_percent) = if self.swap_total >= self.swap_free {
            let swap_used = self.swap_total - self.swap_free;
            (swap_used, pct(swap_used, self.swap_total))
        } else {
            (0, 0.0)
        };

        MemoryStat {
            total: self.total,
            free: self.free,
            available,
            used,
            used_percent: pct(used, self.total),
            swap_total: self.swap_total,
            swap_free: self.swap_free,
            swap_used,
            swap_used_percent,
        }
    }
}

/// Collects memory and swap usage from `/proc/meminfo`.
pub fn collect_memory(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<MemoryStat, CollectError> {
    let path = source.display_path(MEMINFO);
    let lines = read_lines(source, MEMINFO, budget)?;
    Ok(parse_meminfo(&lines, &path, budget)?.to_stat())
}

pub(crate) fn parse_meminfo(
    lines: &[String],
    path: &str,
    budget: &Budget,
) -> Result<MemInfo, CollectError> {
    let entries = parse_rows(lines, path, RowPolicy::Strict, budget, parse_meminfo_row)?;

    let mut info = MemInfo::default();
    for (key, bytes) in entries {
        info.set(key, bytes);
    }
    Ok(info)
}

fn parse_meminfo_row(line: &str) -> Result<Option<(MemKey, u64)>, String> {
    let (label, rest) = match line.split_once(':') {
        Some(parts) => parts,
        None => return Ok(None),
    };
    let label = label.trim();
    let key = match MemKey::from_label(label) {
        Some(key) => key,
        None => return Ok(None),
    };

    let value = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| format!("{} has no value", label))?;
    let kib = parse_counter(value, label)?;

    Ok(Some((key, kib_to_bytes(kib))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(text: &str) -> Result<MemInfo, CollectError> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        parse_meminfo(&lines, "/proc/meminfo", &Budget::unbounded())
    }

    #[test]
    fn test_used_prefers_available() {
        let stat = parse(
            "MemTotal:        1000000 kB\n\
             MemFree:          400000 kB\n\
             MemAvailable:     600000 kB\n\
             Buffers:           10000 kB\n\
             Cached:            50000 kB\n",
        )
        .unwrap()
        .to_stat();

        assert_eq!(stat.total, 1_024_000_000);
        assert_eq!(stat.available, 614_400_000);
        assert_eq!(stat.used, stat.total - stat.available);
        assert_eq!(stat.used, 409_600_000);
        assert!((stat.used_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_used_fallback_without_available() {
        let stat = parse(
            "MemTotal: 1000 kB\nMemFree: 200 kB\nBuffers: 100 kB\nCached: 300 kB\n",
        )
        .unwrap()
        .to_stat();

        assert_eq!(stat.used, 400 * 1024);
        assert_eq!(stat.available, 600 * 1024);
    }

    #[test]
    fn test_used_fallback_floors_at_zero() {
        let stat = parse("MemTotal: 100 kB\nMemFree: 90 kB\nBuffers: 50 kB\nCached: 50 kB\n")
            .unwrap()
            .to_stat();
        assert_eq!(stat.used, 0);
        assert_eq!(stat.used_percent, 0.0);
    }

    #[test]
    fn test_swap_usage() {
        let stat = parse("MemTotal: 100 kB\nSwapTotal: 400 kB\nSwapFree: 100 kB\n")
            .unwrap()
            .to_stat();
        assert_eq!(stat.swap_used, 300 * 1024);
        assert!((stat.swap_used_percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_inconsistent_swap_is_zero() {
        let stat = parse("SwapTotal: 100 kB\nSwapFree: 400 kB\n")
            .unwrap()
            .to_stat();
        assert_eq!(stat.swap_used, 0);
        assert_eq!(stat.swap_used_percent, 0.0);
    }

    #[test]
    fn test_zero_total_has_zero_percent() {
        let stat = parse("").unwrap().to_stat();
        assert_eq!(stat.used_percent, 0.0);
        assert_eq!(stat.swap_used_percent, 0.0);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let info = parse("MemTotal: 10 kB\nHugePages_Total: nope\nDirty: 5 kB\n").unwrap();
        assert_eq!(info.total, 10 * 1024);
    }

    #[test]
    fn test_bad_recognized_value_is_parse_error() {
        let err = parse("MemTotal: 10 kB\nMemFree: lots kB\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("MemFree"));

        let err = parse("MemTotal:\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
