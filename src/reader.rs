//! Cancellable line reader for pseudo-files.
//!
//! Lines are read one at a time and the [`Budget`] is polled before each read.
//! When the budget expires the caller still receives the lines read so far,
//! wrapped in [`Interrupted`] together with the cancellation error, so a
//! truncated read is never mistaken for a short file.

use std::io::{self, BufRead};

use crate::budget::Budget;
use crate::error::CollectError;
use crate::source::HostSource;

/// Which lines of a source to return: skip `offset`, then take up to `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineWindow {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl LineWindow {
    pub const ALL: LineWindow = LineWindow {
        offset: 0,
        limit: None,
    };

    pub fn skip(offset: usize) -> Self {
        Self {
            offset,
            limit: None,
        }
    }

    pub fn take(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    fn is_exhausted(&self, index: usize) -> bool {
        self.limit
            .is_some_and(|limit| index >= self.offset.saturating_add(limit))
    }
}

/// A read that stopped early; `partial` holds every line read before the stop.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Interrupted {
    pub partial: Vec<String>,
    #[source]
    pub error: CollectError,
}

impl Interrupted {
    fn new(partial: Vec<String>, error: CollectError) -> Self {
        Self { partial, error }
    }
}

impl From<Interrupted> for CollectError {
    fn from(interrupted: Interrupted) -> Self {
        interrupted.error
    }
}

/// Reads every line of `rel_path`.
pub fn read_lines(
    source: &dyn HostSource,
    rel_path: &str,
    budget: &Budget,
) -> Result<Vec<String>, Interrupted> {
    read_lines_window(source, rel_path, LineWindow::ALL, budget)
}

/// Reads the lines of `rel_path` inside `window`.
///
/// Reaching end of file before the window is filled is not an error.
pub fn read_lines_window(
    source: &dyn HostSource,
    rel_path: &str,
    window: LineWindow,
    budget: &Budget,
) -> Result<Vec<String>, Interrupted> {
    budget
        .check()
        .map_err(|e| Interrupted::new(Vec::new(), e))?;

    let mut reader = source.open(rel_path).map_err(|e| {
        Interrupted::new(
            Vec::new(),
            CollectError::unavailable(source.display_path(rel_path), e),
        )
    })?;

    let mut lines = Vec::new();
    let mut buf = Vec::new();
    let mut index = 0usize;

    while !window.is_exhausted(index) {
        if let Err(e) = budget.check() {
            return Err(Interrupted::new(lines, e));
        }

        let line = match next_line(&mut reader, &mut buf) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                return Err(Interrupted::new(
                    lines,
                    CollectError::unavailable(source.display_path(rel_path), e),
                ));
            }
        };

        if index >= window.offset {
            lines.push(line);
        }
        index += 1;
    }

    Ok(lines)
}

/// First line of `rel_path` that starts with `prefix`, `None` if no line does.
pub fn read_first_with_prefix(
    source: &dyn HostSource,
    rel_path: &str,
    prefix: &str,
    budget: &Budget,
) -> Result<Option<String>, CollectError> {
    let mut reader = source
        .open(rel_path)
        .map_err(|e| CollectError::unavailable(source.display_path(rel_path), e))?;

    let mut buf = Vec::new();
    loop {
        budget.check()?;
        let line = next_line(&mut reader, &mut buf)
            .map_err(|e| CollectError::unavailable(source.display_path(rel_path), e))?;
        match line {
            None => return Ok(None),
            Some(line) if line.starts_with(prefix) => return Ok(Some(line)),
            Some(_) => {}
        }
    }
}

/// Reads one line as bytes. Invalid UTF-8 (e.g. a latin-1 mount path) is
/// replaced with U+FFFD so a single odd row cannot fail the whole source.
fn next_line(reader: &mut dyn BufRead, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::FsUsage;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TextSource(&'static str);

    impl HostSource for TextSource {
        fn open(&self, rel_path: &str) -> io::Result<Box<dyn BufRead + Send>> {
            if rel_path == "missing" {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            Ok(Box::new(Cursor::new(self.0.as_bytes())))
        }

        fn display_path(&self, rel_path: &str) -> String {
            format!("/fake/{}", rel_path)
        }

        fn fs_usage(&self, _mount_point: &str) -> io::Result<FsUsage> {
            Ok(FsUsage::default())
        }
    }

    struct ByteSource(&'static [u8]);

    impl HostSource for ByteSource {
        fn open(&self, _rel_path: &str) -> io::Result<Box<dyn BufRead + Send>> {
            Ok(Box::new(Cursor::new(self.0)))
        }

        fn display_path(&self, rel_path: &str) -> String {
            format!("/fake/{}", rel_path)
        }

        fn fs_usage(&self, _mount_point: &str) -> io::Result<FsUsage> {
            Ok(FsUsage::default())
        }
    }

    /// Cancels the budget after a fixed number of bytes have been served.
    struct CancelAfter {
        inner: Cursor<&'static [u8]>,
        lines_left: Arc<AtomicUsize>,
        budget: Budget,
    }

    impl io::Read for CancelAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for CancelAfter {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            let consumed = &self.inner.get_ref()[self.inner.position() as usize..];
            let newlines = consumed[..amt].iter().filter(|b| **b == b'\n').count();
            self.inner.consume(amt);
            for _ in 0..newlines {
                if self.lines_left.fetch_sub(1, Ordering::SeqCst) == 1 {
                    self.budget.cancel();
                }
            }
        }
    }

    struct CancellingSource {
        text: &'static str,
        lines_before_cancel: usize,
        budget: Budget,
    }

    impl HostSource for CancellingSource {
        fn open(&self, _rel_path: &str) -> io::Result<Box<dyn BufRead + Send>> {
            Ok(Box::new(CancelAfter {
                inner: Cursor::new(self.text.as_bytes()),
                lines_left: Arc::new(AtomicUsize::new(self.lines_before_cancel)),
                budget: self.budget.clone(),
            }))
        }

        fn display_path(&self, rel_path: &str) -> String {
            rel_path.to_string()
        }

        fn fs_usage(&self, _mount_point: &str) -> io::Result<FsUsage> {
            Ok(FsUsage::default())
        }
    }

    #[test]
    fn test_read_all_lines_trims_newlines() {
        let source = TextSource("a\nb\r\nc");
        let lines = read_lines(&source, "x", &Budget::unbounded()).unwrap();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_read_window_offset_and_limit() {
        let source = TextSource("h1\nh2\none\ntwo\nthree\n");
        let budget = Budget::unbounded();

        let lines = read_lines_window(&source, "x", LineWindow::skip(2), &budget).unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);

        let lines = read_lines_window(&source, "x", LineWindow::take(1, 2), &budget).unwrap();
        assert_eq!(lines, vec!["h2", "one"]);
    }

    #[test]
    fn test_read_window_past_end_is_not_an_error() {
        let source = TextSource("only\n");
        let lines =
            read_lines_window(&source, "x", LineWindow::take(0, 10), &Budget::unbounded()).unwrap();
        assert_eq!(lines, vec!["only"]);
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let source = TextSource("");
        let err = read_lines(&source, "missing", &Budget::unbounded()).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::SourceUnavailable);
        assert!(err.partial.is_empty());
        assert!(err.to_string().contains("/fake/missing"));
    }

    #[test]
    fn test_already_cancelled_budget_reads_nothing() {
        let source = TextSource("a\nb\n");
        let budget = Budget::unbounded();
        budget.cancel();
        let err = read_lines(&source, "x", &budget).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Cancelled);
        assert!(err.partial.is_empty());
    }

    #[test]
    fn test_cancel_mid_read_returns_partial_lines() {
        let budget = Budget::unbounded();
        let source = CancellingSource {
            text: "one\ntwo\nthree\nfour\n",
            lines_before_cancel: 2,
            budget: budget.clone(),
        };
        let err = read_lines(&source, "x", &budget).unwrap_err();
        assert_eq!(err.error.kind(), ErrorKind::Cancelled);
        assert_eq!(err.partial, vec!["one", "two"]);
    }

    #[test]
    fn test_read_first_with_prefix() {
        let source = TextSource("MemTotal: 1 kB\nSwapFree: 2 kB\n");
        let budget = Budget::unbounded();
        assert_eq!(
            read_first_with_prefix(&source, "x", "Swap", &budget).unwrap(),
            Some("SwapFree: 2 kB".to_string())
        );
        assert_eq!(
            read_first_with_prefix(&source, "x", "Nope", &budget).unwrap(),
            None
        );
    }

    #[test]
    fn test_invalid_utf8_line_is_decoded_lossily() {
        let source = ByteSource(b"/dev/sda / ext4 rw 0 0\n/dev/sdb /media/usb\xe9 vfat rw 0 0\n");
        let lines = read_lines(&source, "mounts", &Budget::unbounded()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "/dev/sda / ext4 rw 0 0");
        assert_eq!(lines[1], "/dev/sdb /media/usb\u{FFFD} vfat rw 0 0");

        let found =
            read_first_with_prefix(&source, "mounts", "/dev/sdb", &Budget::unbounded()).unwrap();
        assert!(found.is_some_and(|line| line.contains("vfat")));
    }
}
