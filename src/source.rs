//! Access to kernel pseudo-files and filesystem capacity.
//!
//! Collectors never touch `std::fs` directly; they go through [`HostSource`]
//! so that the same parsing code runs against the live `/proc` or against a
//! synthetic tree in tests.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// Relative pseudo-file paths under the proc root.
pub const CPUINFO: &str = "cpuinfo";
pub const STAT: &str = "stat";
pub const LOADAVG: &str = "loadavg";
pub const MEMINFO: &str = "meminfo";
pub const MOUNTS: &str = "mounts";
pub const DISKSTATS: &str = "diskstats";
pub const NET_DEV: &str = "net/dev";

/// Every pseudo-file the engine reads, in collection order.
pub const ALL_SOURCES: [&str; 7] = [CPUINFO, STAT, LOADAVG, MEMINFO, MOUNTS, DISKSTATS, NET_DEV];

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_IO_BUFFER_KB: usize = 64;

/// Raw capacity figures of one mounted filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsUsage {
    pub block_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
}

impl FsUsage {
    pub fn total_bytes(&self) -> u64 {
        self.blocks.saturating_mul(self.block_size)
    }

    pub fn free_bytes(&self) -> u64 {
        self.blocks_free.saturating_mul(self.block_size)
    }

    pub fn available_bytes(&self) -> u64 {
        self.blocks_available.saturating_mul(self.block_size)
    }
}

/// Source of pseudo-file text and capacity queries.
pub trait HostSource: Send + Sync {
    /// Opens `rel_path` (e.g. `net/dev`) for line reading.
    fn open(&self, rel_path: &str) -> io::Result<Box<dyn BufRead + Send>>;

    /// Human-readable location of `rel_path`, used in errors and logs.
    fn display_path(&self, rel_path: &str) -> String;

    /// Capacity of the filesystem mounted at `mount_point`.
    fn fs_usage(&self, mount_point: &str) -> io::Result<FsUsage>;

    fn hostname(&self) -> io::Result<String> {
        let name = nix::unistd::gethostname().map_err(io::Error::from)?;
        Ok(name.to_string_lossy().into_owned())
    }
}

/// The live procfs, optionally rooted somewhere other than `/proc`.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    io_buffer_kb: usize,
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            io_buffer_kb: DEFAULT_IO_BUFFER_KB,
        }
    }

    pub fn with_io_buffer_kb(mut self, kb: usize) -> Self {
        self.io_buffer_kb = kb.max(1);
        self
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl HostSource for ProcFs {
    fn open(&self, rel_path: &str) -> io::Result<Box<dyn BufRead + Send>> {
        let file = fs::File::open(self.root.join(rel_path))?;
        Ok(Box::new(BufReader::with_capacity(
            self.io_buffer_kb * 1024,
            file,
        )))
    }

    fn display_path(&self, rel_path: &str) -> String {
        self.root.join(rel_path).display().to_string()
    }

    fn fs_usage(&self, mount_point: &str) -> io::Result<FsUsage> {
        let stat = nix::sys::statvfs::statvfs(mount_point).map_err(io::Error::from)?;

        // f_frsize is the unit for f_blocks; f_bsize is only the preferred I/O size.
        Ok(FsUsage {
            block_size: stat.fragment_size() as u64,
            blocks: stat.blocks() as u64,
            blocks_free: stat.blocks_free() as u64,
            blocks_available: stat.blocks_available() as u64,
            files: stat.files() as u64,
            files_free: stat.files_free() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_procfs_open_under_custom_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("net")).unwrap();
        fs::write(dir.path().join(NET_DEV), "header\n").unwrap();

        let source = ProcFs::new(dir.path()).with_io_buffer_kb(4);
        let mut content = String::new();
        source
            .open(NET_DEV)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "header\n");
        assert!(source.display_path(NET_DEV).ends_with("net/dev"));
    }

    #[test]
    fn test_procfs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcFs::new(dir.path());
        let err = source.open(MEMINFO).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_fs_usage_root() {
        let usage = ProcFs::default().fs_usage("/").unwrap();
        assert!(usage.block_size > 0);
        assert!(usage.total_bytes() >= usage.free_bytes());
    }

    #[test]
    fn test_fs_usage_saturates() {
        let usage = FsUsage {
            block_size: u64::MAX,
            blocks: 2,
            ..FsUsage::default()
        };
        assert_eq!(usage.total_bytes(), u64::MAX);
        assert_eq!(usage.free_bytes(), 0);
    }
}
