//! Disk capacity and I/O per mounted whole disk.
//!
//! Joins the I/O counter table with the mount table on device name, then asks
//! the filesystem for capacity at the mount point. Devices missing from either
//! table, or whose capacity query fails, produce no record.

use tracing::{debug, warn};

use super::diskstats::{read_disk_io, DiskIoCounters};
use super::mounts::{read_mounts, MountMap};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::models::DiskStat;
use crate::source::{FsUsage, HostSource};
use crate::units::pct;

/// Collects one [`DiskStat`] per mounted, physically backed whole disk.
pub fn collect_disks(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<Vec<DiskStat>, CollectError> {
    let mounts = read_mounts(source, budget)?;
    let io_stats = read_disk_io(source, budget)?;
    join_disks(source, &mounts, &io_stats, budget)
}

/// Joins I/O counters with mount points, preserving `/proc/diskstats` order.
pub fn join_disks(
    source: &dyn HostSource,
    mounts: &MountMap,
    io_stats: &[DiskIoCounters],
    budget: &Budget,
) -> Result<Vec<DiskStat>, CollectError> {
    let mut disks = Vec::new();

    for io in io_stats {
        budget.check()?;

        let mount_point = match mounts.get(&io.name) {
            Some(mount_point) => mount_point,
            None => {
                debug!("Device {} has no mount point, skipping", io.name);
                continue;
            }
        };

        // statvfs can block on a hung network filesystem; only the budget
        // check on the next device bounds that.
        match source.fs_usage(mount_point) {
            Ok(usage) => disks.push(build_disk_stat(io, mount_point, &usage)),
            Err(e) => {
                warn!(
                    "Failed to stat filesystem at {} ({}): {}",
                    mount_point, io.name, e
                );
            }
        }
    }

    Ok(disks)
}

fn build_disk_stat(io: &DiskIoCounters, mount_point: &str, usage: &FsUsage) -> DiskStat {
    let total = usage.total_bytes();
    let free = usage.free_bytes();
    let used = total.saturating_sub(free);
    let inodes_used = usage.files.saturating_sub(usage.files_free);

    DiskStat {
        mount_point: mount_point.to_string(),
        device: io.name.clone(),
        total,
        used,
        free,
        available: usage.available_bytes(),
        used_percent: pct(used, total),
        inodes_total: usage.files,
        inodes_used,
        inodes_free: usage.files_free,
        inodes_used_percent: pct(inodes_used, usage.files),
        read: io.read_ios,
        write: io.write_ios,
        read_bytes: io.read_bytes(),
        write_bytes: io.write_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap as HashMap;
    use std::io::{self, BufRead};

    struct CapacitySource {
        usage: HashMap<&'static str, FsUsage>,
    }

    impl HostSource for CapacitySource {
        fn open(&self, _rel_path: &str) -> io::Result<Box<dyn BufRead + Send>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "not used"))
        }

        fn display_path(&self, rel_path: &str) -> String {
            rel_path.to_string()
        }

        fn fs_usage(&self, mount_point: &str) -> io::Result<FsUsage> {
            self.usage
                .get(mount_point)
                .copied()
                .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn counters(name: &str, read_ios: u64, write_ios: u64) -> DiskIoCounters {
        DiskIoCounters {
            name: name.to_string(),
            read_ios,
            read_sectors: read_ios * 8,
            write_ios,
            write_sectors: write_ios * 8,
        }
    }

    #[test]
    fn test_join_skips_unmounted_and_unstatable() {
        let mut usage = HashMap::new();
        usage.insert(
            "/",
            FsUsage {
                block_size: 4096,
                blocks: 1000,
                blocks_free: 250,
                blocks_available: 200,
                files: 100,
                files_free: 40,
            },
        );
        let source = CapacitySource { usage };

        let mut mounts = MountMap::new();
        mounts.insert("sda".to_string(), "/".to_string());
        mounts.insert("sdc".to_string(), "/broken".to_string());

        let io = vec![
            counters("sda", 10, 20),
            counters("sdb", 1, 1),
            counters("sdc", 5, 5),
        ];

        let disks = join_disks(&source, &mounts, &io, &Budget::unbounded()).unwrap();
        assert_eq!(disks.len(), 1);

        let sda = &disks[0];
        assert_eq!(sda.device, "sda");
        assert_eq!(sda.mount_point, "/");
        assert_eq!(sda.total, 4_096_000);
        assert_eq!(sda.free, 1_024_000);
        assert_eq!(sda.available, 819_200);
        assert_eq!(sda.used, 3_072_000);
        assert!((sda.used_percent - 75.0).abs() < 1e-9);
        assert_eq!(sda.inodes_used, 60);
        assert!((sda.inodes_used_percent - 60.0).abs() < 1e-9);
        assert_eq!(sda.read, 10);
        assert_eq!(sda.write, 20);
        assert_eq!(sda.read_bytes, 80 * 512);
    }

    #[test]
    fn test_zero_capacity_has_zero_percent() {
        let stat = build_disk_stat(&counters("sda", 0, 0), "/", &FsUsage::default());
        assert_eq!(stat.used_percent, 0.0);
        assert_eq!(stat.inodes_used_percent, 0.0);
    }
}
