//! Disk I/O statistics collector.
//!
//! Reads cumulative per-device counters from `/proc/diskstats`, keeping only
//! whole physical disks.
//! Format: major minor name read_ios read_merges read_sectors read_ticks write_ios write_merges write_sectors write_ticks ios_in_progress time_in_queue weighted_time_in_queue

use super::{parse_counter, parse_rows, RowPolicy};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::reader::read_lines;
use crate::source::{HostSource, DISKSTATS};

/// `/proc/diskstats` counts sectors in 512-byte units regardless of the
/// device's real sector size.
pub const SECTOR_SIZE: u64 = 512;

const MIN_FIELDS: usize = 14;

/// Cumulative I/O counters for one whole disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskIoCounters {
    pub name: String,
    pub read_ios: u64,
    pub read_sectors: u64,
    pub write_ios: u64,
    pub write_sectors: u64,
}

impl DiskIoCounters {
    pub fn read_bytes(&self) -> u64 {
        self.read_sectors.saturating_mul(SECTOR_SIZE)
    }

    pub fn write_bytes(&self) -> u64 {
        self.write_sectors.saturating_mul(SECTOR_SIZE)
    }
}

/// Loop and RAM disks are not physical storage.
pub fn is_virtual_block_device(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram")
}

/// Purely syntactic partition check.
///
/// - NVMe: `nvme0n1` is a disk, anything with a `p` after the `nvme` prefix
///   (`nvme0n1p1`) is a partition.
/// - Everything else: a name longer than 3 characters whose suffix after the
///   third character parses as an integer (`sda1`, `vdb12`) is a partition.
///
/// Known misclassifications: `xvda1` and `mmcblk0p1` count as whole disks,
/// `dm-0` counts as a partition. No kernel attribute such as
/// `/sys/class/block/<name>/partition` is consulted.
pub fn is_partition(name: &str) -> bool {
    if let Some(rest) = name.strip_prefix("nvme") {
        return rest.contains('p');
    }

    name.len() > 3
        && name
            .get(3..)
            .is_some_and(|suffix| suffix.parse::<i64>().is_ok())
}

/// Reads `/proc/diskstats`, keeping whole physical disks in file order.
pub fn read_disk_io(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<Vec<DiskIoCounters>, CollectError> {
    let path = source.display_path(DISKSTATS);
    let lines = read_lines(source, DISKSTATS, budget)?;
    parse_diskstats(&lines, &path, budget)
}

pub(crate) fn parse_diskstats(
    lines: &[String],
    path: &str,
    budget: &Budget,
) -> Result<Vec<DiskIoCounters>, CollectError> {
    parse_rows(lines, path, RowPolicy::BestEffort, budget, parse_diskstats_row)
}

fn parse_diskstats_row(line: &str) -> Result<Option<DiskIoCounters>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return Err(format!("expected at least {} fields, got {}", MIN_FIELDS, parts.len()));
    }

    let name = parts[2];
    if is_virtual_block_device(name) || is_partition(name) {
        return Ok(None);
    }

    Ok(Some(DiskIoCounters {
        name: name.to_string(),
        read_ios: parse_counter(parts[3], "read_ios")?,
        read_sectors: parse_counter(parts[5], "read_sectors")?,
        write_ios: parse_counter(parts[7], "write_ios")?,
        write_sectors: parse_counter(parts[9], "write_sectors")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_heuristic() {
        assert!(!is_partition("sda"));
        assert!(is_partition("sda1"));
        assert!(is_partition("vdb12"));
        assert!(!is_partition("nvme0n1"));
        assert!(is_partition("nvme0n1p1"));
    }

    #[test]
    fn test_partition_heuristic_known_limitations() {
        assert!(!is_partition("xvda1"));
        assert!(!is_partition("mmcblk0p1"));
        assert!(is_partition("dm-0"));
    }

    #[test]
    fn test_virtual_block_devices() {
        assert!(is_virtual_block_device("loop0"));
        assert!(is_virtual_block_device("ram15"));
        assert!(!is_virtual_block_device("sda"));
    }

    #[test]
    fn test_parse_diskstats_keeps_whole_disks() {
        let lines: Vec<String> = [
            "   8       0 sda 1000 10 20000 300 500 5 8000 200 0 400 500 0 0 0 0",
            "   8       1 sda1 900 10 18000 280 480 5 7800 190 0 380 470 0 0 0 0",
            "   7       0 loop0 10 0 20 0 0 0 0 0 0 0 0",
            "   7       1 loop1 10 0 20 0 0 0 0 0 0 0 0 0 0 0 0",
            " 259       0 nvme0n1 42 0 84 1 7 0 56 1 0 2",
            " 259       0 nvme1n1 42 0 84 1 7 0 56 1 0 2 2 0",
            " 259       1 nvme1n1p1 40 0 80 1 7 0 56 1 0 2 2 0",
            " 252       0 vda 1 0 x 0 0 0 0 0 0 0 0 0",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let stats = parse_diskstats(&lines, "/proc/diskstats", &Budget::unbounded()).unwrap();
        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["sda", "nvme1n1"]);

        let sda = &stats[0];
        assert_eq!(sda.read_ios, 1000);
        assert_eq!(sda.read_sectors, 20000);
        assert_eq!(sda.write_ios, 500);
        assert_eq!(sda.write_sectors, 8000);
        assert_eq!(sda.read_bytes(), 20000 * 512);
        assert_eq!(sda.write_bytes(), 8000 * 512);
    }
}
