//! Mount table correlator.
//!
//! Builds a device-name to mount-point map from `/proc/mounts`, leaving out
//! kernel-synthesized filesystems. The device name is the `/dev/` path with
//! its prefix stripped so it can be joined against `/proc/diskstats`.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use once_cell::sync::Lazy;

use super::{parse_rows, RowPolicy};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::reader::read_lines;
use crate::source::{HostSource, MOUNTS};

/// Device name (without `/dev/`) to mount point.
pub type MountMap = HashMap<String, String>;

/// Filesystem types that are never backed by a physical disk.
///
/// This is a fixed policy list; new kernel pseudo-filesystems must be added
/// here by hand.
pub const VIRTUAL_FS_TYPES: &[&str] = &[
    "tmpfs",
    "devtmpfs",
    "overlay",
    "aufs",
    "devpts",
    "sysfs",
    "proc",
    "cgroup",
    "cgroup2",
    "securityfs",
    "pstore",
    "efivarfs",
    "bpf",
    "tracefs",
    "hugetlbfs",
    "mqueue",
    "fusectl",
    "configfs",
    "debugfs",
    "selinuxfs",
    "autofs",
    "binfmt_misc",
];

static VIRTUAL_FS_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| VIRTUAL_FS_TYPES.iter().copied().collect());

/// One usable row of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

pub fn is_virtual_fs(fstype: &str) -> bool {
    VIRTUAL_FS_SET.contains(fstype)
}

/// `/dev/sda` -> `sda`; names without the prefix pass through unchanged.
pub fn device_name(device: &str) -> &str {
    device.strip_prefix("/dev/").unwrap_or(device)
}

/// Reads `/proc/mounts` into a [`MountMap`].
///
/// When a device is mounted more than once the last row wins.
pub fn read_mounts(source: &dyn HostSource, budget: &Budget) -> Result<MountMap, CollectError> {
    let path = source.display_path(MOUNTS);
    let lines = read_lines(source, MOUNTS, budget)?;
    let entries = parse_mount_rows(&lines, &path, budget)?;

    Ok(entries
        .into_iter()
        .map(|entry| (entry.device, entry.mount_point))
        .collect())
}

pub(crate) fn parse_mount_rows(
    lines: &[String],
    path: &str,
    budget: &Budget,
) -> Result<Vec<MountEntry>, CollectError> {
    parse_rows(lines, path, RowPolicy::BestEffort, budget, parse_mount_row)
}

fn parse_mount_row(line: &str) -> Result<Option<MountEntry>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!("expected at least 3 fields, got {}", parts.len()));
    }

    let fstype = parts[2];
    if is_virtual_fs(fstype) {
        return Ok(None);
    }

    Ok(Some(MountEntry {
        device: device_name(parts[0]).to_string(),
        mount_point: parts[1].to_string(),
        fstype: fstype.to_string(),
    }))
}
