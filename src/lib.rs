//! procsnap - point-in-time host telemetry from Linux pseudo-files.
//!
//! The library reads `/proc/cpuinfo`, `/proc/stat`, `/proc/loadavg`,
//! `/proc/meminfo`, `/proc/mounts`, `/proc/diskstats` and `/proc/net/dev`
//! plus one `statvfs(2)` per mounted disk, and normalizes them into a single
//! [`Metrics`] snapshot.
//!
//! # Features
//!
//! - **Cancellable**: every collector polls a shared [`Budget`] (cancellation
//!   token plus deadline) at each line and row boundary
//! - **Partial results**: a failing domain is reported in [`CollectErrors`]
//!   while the other domains still fill in their part of the snapshot
//! - **Sequential or parallel**: domains can be fanned out on the rayon pool
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use procsnap::{Budget, Collector, ProcFs, SnapshotCollector};
//!
//! let collector = SnapshotCollector::new(ProcFs::default());
//! let (metrics, errors) = collector.collect(&Budget::with_timeout(Duration::from_secs(5)));
//!
//! println!("{} cores, {:.1}% busy", metrics.cpu.cores, metrics.cpu.usage_percent);
//! if !errors.is_empty() {
//!     eprintln!("partial snapshot: {}", errors);
//! }
//! ```
//!
//! Counters are cumulative since boot. Rates need two snapshots and a diff,
//! which is left to the caller.

pub mod budget;
pub mod collectors;
pub mod error;
pub mod models;
pub mod reader;
pub mod snapshot;
pub mod source;
pub mod units;

// Re-export main types for convenience
pub use budget::Budget;
pub use error::{CollectError, CollectErrors, Domain, DomainError, ErrorKind};
pub use models::{CpuStat, DiskStat, MemoryStat, Metrics, NetStat};
pub use snapshot::{CollectMode, Collector, SnapshotCollector, SnapshotState};
pub use source::{FsUsage, HostSource, ProcFs};
