//! Domain collectors for system metrics.
//!
//! Each collector reads one or more pseudo-files through a
//! [`HostSource`](crate::source::HostSource) and turns them into typed records:
//! CPU, memory, mount table, disk I/O counters, disk capacity and network
//! interface statistics.

pub mod cpu;
pub mod disk;
pub mod diskstats;
pub mod memory;
pub mod mounts;
pub mod netdev;

use tracing::warn;

use crate::budget::Budget;
use crate::error::CollectError;

/// How a malformed row affects the rest of its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// The first malformed row fails the whole domain.
    Strict,
    /// Malformed rows are logged and skipped.
    BestEffort,
}

/// Runs `parse` over every row, polling the budget at each row boundary.
///
/// `parse` returns `Ok(Some(_))` to keep a row, `Ok(None)` for rows that are
/// legitimately ignored (headers, filtered devices) and `Err(detail)` for
/// malformed rows, which are then handled according to `policy`.
pub(crate) fn parse_rows<T, F>(
    lines: &[String],
    path: &str,
    policy: RowPolicy,
    budget: &Budget,
    mut parse: F,
) -> Result<Vec<T>, CollectError>
where
    F: FnMut(&str) -> Result<Option<T>, String>,
{
    let mut rows = Vec::with_capacity(lines.len());

    for line in lines {
        budget.check()?;

        match parse(line) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(detail) => match policy {
                RowPolicy::Strict => {
                    return Err(CollectError::parse(
                        path,
                        format!("{} in row {:?}", detail, line),
                    ));
                }
                RowPolicy::BestEffort => {
                    warn!("Skipping malformed row in {}: {} ({:?})", path, detail, line);
                }
            },
        }
    }

    Ok(rows)
}

/// Parses an unsigned counter field, naming it in the error.
pub(crate) fn parse_counter(field: &str, name: &str) -> Result<u64, String> {
    field
        .parse::<u64>()
        .map_err(|e| format!("invalid {} {:?}: {}", name, field, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn parse_even(line: &str) -> Result<Option<u64>, String> {
        if line.is_empty() {
            return Ok(None);
        }
        let n = parse_counter(line, "value")?;
        if n % 2 == 0 {
            Ok(Some(n))
        } else {
            Err("odd".to_string())
        }
    }

    #[test]
    fn test_best_effort_skips_bad_rows() {
        let lines = rows(&["2", "", "3", "x", "4"]);
        let out = parse_rows(
            &lines,
            "/t",
            RowPolicy::BestEffort,
            &Budget::unbounded(),
            parse_even,
        )
        .unwrap();
        assert_eq!(out, vec![2, 4]);
    }

    #[test]
    fn test_strict_fails_on_first_bad_row() {
        let lines = rows(&["2", "3", "4"]);
        let err = parse_rows(&lines, "/t", RowPolicy::Strict, &Budget::unbounded(), parse_even)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("odd"));
    }

    #[test]
    fn test_rows_stop_on_cancel() {
        let lines = rows(&["2", "4"]);
        let budget = Budget::unbounded();
        budget.cancel();
        let err = parse_rows(&lines, "/t", RowPolicy::BestEffort, &budget, parse_even).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
