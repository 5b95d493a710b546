//! Network interface statistics collector.
//!
//! Reads cumulative per-interface counters from `/proc/net/dev`. Unlike the
//! CPU and disk tables this one is parsed strictly: a short or non-numeric
//! row fails the network domain, since a misaligned row would otherwise shift
//! receive and transmit counters without any visible sign.

use super::{parse_counter, parse_rows, RowPolicy};
use crate::budget::Budget;
use crate::error::CollectError;
use crate::models::NetStat;
use crate::reader::{read_lines_window, LineWindow};
use crate::source::{HostSource, NET_DEV};

/// `/proc/net/dev` starts with two header lines.
const HEADER_LINES: usize = 2;
const MIN_FIELDS: usize = 12;

/// Reads network interface statistics, in kernel order.
pub fn collect_network(
    source: &dyn HostSource,
    budget: &Budget,
) -> Result<Vec<NetStat>, CollectError> {
    let path = source.display_path(NET_DEV);
    let lines = read_lines_window(source, NET_DEV, LineWindow::skip(HEADER_LINES), budget)?;
    parse_netdev(&lines, &path, budget)
}

pub(crate) fn parse_netdev(
    lines: &[String],
    path: &str,
    budget: &Budget,
) -> Result<Vec<NetStat>, CollectError> {
    parse_rows(lines, path, RowPolicy::Strict, budget, parse_netdev_row)
}

/// Splits on the last `:`; an interface name containing a colon would shift
/// part of the name into the counters.
fn parse_netdev_row(line: &str) -> Result<Option<NetStat>, String> {
    let (name, counters) = match line.rsplit_once(':') {
        Some(parts) => parts,
        None => return Ok(None),
    };

    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let values: Vec<&str> = counters.split_whitespace().collect();
    if values.len() < MIN_FIELDS {
        return Err(format!(
            "interface {} has {} counters, expected at least {}",
            name,
            values.len(),
            MIN_FIELDS
        ));
    }

    Ok(Some(NetStat {
        name: name.to_string(),
        rx_bytes: parse_counter(values[0], "rx_bytes")?,
        rx_packets: parse_counter(values[1], "rx_packets")?,
        rx_errors: parse_counter(values[2], "rx_errors")?,
        rx_dropped: parse_counter(values[3], "rx_dropped")?,
        tx_bytes: parse_counter(values[8], "tx_bytes")?,
        tx_packets: parse_counter(values[9], "tx_packets")?,
        tx_errors: parse_counter(values[10], "tx_errors")?,
        tx_dropped: parse_counter(values[11], "tx_dropped")?,
    }))
}
