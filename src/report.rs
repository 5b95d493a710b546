//! Snapshot rendering for stdout.
//!
//! JSON and YAML dump the [`Metrics`] record as-is. The table format is for
//! people at a terminal and scales byte counters with [`human_bytes`].

use std::fmt::Write;

use procsnap::units::human_bytes;
use procsnap::{CollectErrors, Metrics};

use crate::cli::OutputFormat;

/// Renders one snapshot in the requested format.
pub fn render(
    metrics: &Metrics,
    format: OutputFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(metrics)?,
        OutputFormat::Yaml => serde_yaml::to_string(metrics)?,
        OutputFormat::Table => render_table(metrics),
    })
}

/// One warning line per failed domain, for stderr.
pub fn error_lines(errors: &CollectErrors) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("⚠️  {} collection failed: {}", e.domain, e.error))
        .collect()
}

pub fn render_table(metrics: &Metrics) -> String {
    let mut out = String::new();

    writeln!(out, "Host: {}  ({})", metrics.host, metrics.update_timestamp).ok();

    let cpu = &metrics.cpu;
    writeln!(out, "\nCPU").ok();
    writeln!(
        out,
        "  cores: {:<4} usage: {:>6.2}%   load: {:.2} {:.2} {:.2}",
        cpu.cores, cpu.usage_percent, cpu.load1, cpu.load5, cpu.load15
    )
    .ok();
    for (idx, usage) in cpu.per_cpu_usage.iter().enumerate() {
        writeln!(out, "  cpu{:<3} {:>6.2}%", idx, usage).ok();
    }

    let mem = &metrics.memory;
    writeln!(out, "\nMemory").ok();
    writeln!(
        out,
        "  total: {:>10}  used: {:>10} ({:.1}%)  free: {:>10}  available: {:>10}",
        human_bytes(mem.total),
        human_bytes(mem.used),
        mem.used_percent,
        human_bytes(mem.free),
        human_bytes(mem.available)
    )
    .ok();
    writeln!(
        out,
        "  swap:  {:>10}  used: {:>10} ({:.1}%)",
        human_bytes(mem.swap_total),
        human_bytes(mem.swap_used),
        mem.swap_used_percent
    )
    .ok();

    writeln!(out, "\nDisks").ok();
    if metrics.disk.is_empty() {
        writeln!(out, "  (none)").ok();
    }
    for disk in &metrics.disk {
        writeln!(
            out,
            "  {:<10} {:<20} {:>10} / {:>10} ({:>5.1}%)  inodes {:>5.1}%  read {:>10}  written {:>10}",
            disk.device,
            disk.mount_point,
            human_bytes(disk.used),
            human_bytes(disk.total),
            disk.used_percent,
            disk.inodes_used_percent,
            human_bytes(disk.read_bytes),
            human_bytes(disk.write_bytes)
        )
        .ok();
    }

    writeln!(out, "\nNetwork").ok();
    if metrics.net.is_empty() {
        writeln!(out, "  (none)").ok();
    }
    for net in &metrics.net {
        writeln!(
            out,
            "  {:<12} rx {:>10} ({} pkts, {} err, {} drop)  tx {:>10} ({} pkts, {} err, {} drop)",
            net.name,
            human_bytes(net.rx_bytes),
            net.rx_packets,
            net.rx_errors,
            net.rx_dropped,
            human_bytes(net.tx_bytes),
            net.tx_packets,
            net.tx_errors,
            net.tx_dropped
        )
        .ok();
    }

    out
}
