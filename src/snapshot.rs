//! Snapshot aggregation.
//!
//! [`SnapshotCollector`] runs the CPU, memory, disk and network collectors
//! under one [`Budget`] and merges whatever succeeded into a single
//! [`Metrics`]. A failing domain is recorded in [`CollectErrors`] and its part
//! of the snapshot stays at the zero/empty default.

use std::time::Instant;

use tracing::{info, trace, warn};

use crate::budget::Budget;
use crate::collectors::{cpu, disk, memory, netdev};
use crate::error::{CollectError, CollectErrors, Domain};
use crate::models::{CpuStat, DiskStat, MemoryStat, Metrics, NetStat};
use crate::source::HostSource;

/// Produces one host snapshot per call.
///
/// Implementations never panic on bad input; every failure is reported in
/// the returned [`CollectErrors`].
pub trait Collector {
    fn collect(&self, budget: &Budget) -> (Metrics, CollectErrors);
}

/// Whether domains run one after another or fanned out on the rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectMode {
    /// CPU, memory, disk, network, in that order.
    #[default]
    Sequential,
    Parallel,
}

/// Lifecycle of a single collection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotState {
    Idle,
    Collecting,
    Complete,
    Cancelled,
}

impl SnapshotState {
    /// Terminal state implied by the errors of a finished collection.
    pub fn from_errors(errors: &CollectErrors) -> Self {
        if errors.is_cancelled() {
            SnapshotState::Cancelled
        } else {
            SnapshotState::Complete
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SnapshotState::Complete | SnapshotState::Cancelled)
    }
}

struct DomainResults {
    cpu: Result<CpuStat, CollectError>,
    memory: Result<MemoryStat, CollectError>,
    disk: Result<Vec<DiskStat>, CollectError>,
    net: Result<Vec<NetStat>, CollectError>,
}

/// Collector backed by a [`HostSource`], normally [`crate::source::ProcFs`].
#[derive(Debug, Clone)]
pub struct SnapshotCollector<S> {
    source: S,
    mode: CollectMode,
}

impl<S: HostSource> SnapshotCollector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            mode: CollectMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: CollectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> CollectMode {
        self.mode
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn collect_sequential(&self, budget: &Budget) -> DomainResults {
        let source: &dyn HostSource = &self.source;
        DomainResults {
            cpu: cpu::collect_cpu(source, budget),
            memory: memory::collect_memory(source, budget),
            disk: disk::collect_disks(source, budget),
            net: netdev::collect_network(source, budget),
        }
    }

    fn collect_parallel(&self, budget: &Budget) -> DomainResults {
        let source: &dyn HostSource = &self.source;
        let ((cpu, memory), (disk, net)) = rayon::join(
            || {
                rayon::join(
                    || cpu::collect_cpu(source, budget),
                    || memory::collect_memory(source, budget),
                )
            },
            || {
                rayon::join(
                    || disk::collect_disks(source, budget),
                    || netdev::collect_network(source, budget),
                )
            },
        );
        DomainResults {
            cpu,
            memory,
            disk,
            net,
        }
    }

    fn hostname(&self) -> String {
        match self.source.hostname() {
            Ok(name) => name,
            Err(e) => {
                warn!("Failed to read hostname: {}", e);
                String::new()
            }
        }
    }
}

impl<S: HostSource> Collector for SnapshotCollector<S> {
    fn collect(&self, budget: &Budget) -> (Metrics, CollectErrors) {
        let started = Instant::now();
        trace!("Collecting snapshot ({:?})", self.mode);

        let mut metrics = Metrics {
            host: self.hostname(),
            update_timestamp: chrono::Local::now().to_rfc3339(),
            ..Metrics::default()
        };
        let mut errors = CollectErrors::new();

        let results = match self.mode {
            CollectMode::Sequential => self.collect_sequential(budget),
            CollectMode::Parallel => self.collect_parallel(budget),
        };

        if let Some(cpu) = merge(Domain::Cpu, results.cpu, &mut errors) {
            metrics.cpu = cpu;
        }
        if let Some(memory) = merge(Domain::Memory, results.memory, &mut errors) {
            metrics.memory = memory;
        }
        if let Some(disk) = merge(Domain::Disk, results.disk, &mut errors) {
            metrics.disk = disk;
        }
        if let Some(net) = merge(Domain::Network, results.net, &mut errors) {
            metrics.net = net;
        }

        info!(
            "Snapshot {:?} in {:.2}ms: {} disks, {} interfaces, {} failed domains",
            SnapshotState::from_errors(&errors),
            started.elapsed().as_secs_f64() * 1000.0,
            metrics.disk.len(),
            metrics.net.len(),
            errors.len()
        );

        (metrics, errors)
    }
}

fn merge<T>(
    domain: Domain,
    result: Result<T, CollectError>,
    errors: &mut CollectErrors,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to collect {} metrics: {}", domain, e);
            errors.push(domain, e);
            None
        }
    }
}
