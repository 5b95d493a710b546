//! Snapshot command implementation.
//!
//! Takes `count` snapshots spaced by the refresh interval. Each snapshot gets
//! its own deadline derived from the process-wide cancellation token, and the
//! blocking collection runs on tokio's blocking pool.

use std::sync::Arc;
use std::time::Instant;

use procsnap::{Budget, Collector, ProcFs, SnapshotCollector, SnapshotState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::report;

/// Worst result over all snapshots of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapshotOutcome {
    Complete,
    Partial,
    Cancelled,
}

impl SnapshotOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            SnapshotOutcome::Complete => 0,
            SnapshotOutcome::Partial => 2,
            SnapshotOutcome::Cancelled => 130,
        }
    }
}

pub fn collector_from_config(config: &Config) -> SnapshotCollector<ProcFs> {
    let source = ProcFs::new(config.proc_root()).with_io_buffer_kb(config.io_buffer_kb());
    SnapshotCollector::new(source).with_mode(config.collect_mode())
}

/// Runs the snapshot loop until `count` snapshots are printed or `shutdown` fires.
pub async fn command_snapshot(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<SnapshotOutcome, Box<dyn std::error::Error>> {
    let collector = Arc::new(collector_from_config(config));
    let count = config.count();
    let interval = config.refresh_interval();
    let timeout = config.timeout();
    let format = config.output_format();

    info!(
        "Taking {} snapshot(s) from {} ({:?}, timeout {:?})",
        count,
        config.proc_root().display(),
        collector.mode(),
        timeout
    );

    let mut outcome = SnapshotOutcome::Complete;

    for round in 0..count {
        if round > 0 {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested between snapshots");
                    return Ok(outcome.max(SnapshotOutcome::Cancelled));
                }
            }
        }

        let budget = Budget::with_deadline(shutdown.child_token(), Instant::now() + timeout);
        let worker = Arc::clone(&collector);
        let (metrics, errors) =
            tokio::task::spawn_blocking(move || worker.collect(&budget)).await?;

        println!("{}", report::render(&metrics, format)?);
        for line in report::error_lines(&errors) {
            eprintln!("{}", line);
        }

        let this_round = match SnapshotState::from_errors(&errors) {
            SnapshotState::Cancelled => SnapshotOutcome::Cancelled,
            _ if !errors.is_empty() => SnapshotOutcome::Partial,
            _ => SnapshotOutcome::Complete,
        };
        debug!("Snapshot {}/{} finished: {:?}", round + 1, count, this_round);
        outcome = outcome.max(this_round);

        if shutdown.is_cancelled() {
            break;
        }
    }

    Ok(outcome)
}
