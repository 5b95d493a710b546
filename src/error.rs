//! Error types for the collection engine.
//!
//! Errors are scoped to one [`Domain`]. A failed domain never aborts its
//! siblings; the snapshot collector gathers every failure into
//! [`CollectErrors`] and returns it next to the partial [`crate::Metrics`].

use std::fmt;
use std::io;

use serde::Serialize;

/// A single failure while reading or parsing one pseudo-file.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("{path} unavailable: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("collection cancelled")]
    Cancelled,
}

/// Discriminant of [`CollectError`], handy for matching in callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    SourceUnavailable,
    Parse,
    Cancelled,
}

impl CollectError {
    pub fn parse(path: impl Into<String>, detail: impl Into<String>) -> Self {
        CollectError::Parse {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn unavailable(path: impl Into<String>, source: io::Error) -> Self {
        CollectError::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectError::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            CollectError::Parse { .. } => ErrorKind::Parse,
            CollectError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Resource domains collected independently within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl Domain {
    pub const ALL: [Domain; 4] = [Domain::Cpu, Domain::Memory, Domain::Disk, Domain::Network];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Memory => "memory",
            Domain::Disk => "disk",
            Domain::Network => "network",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure record for one domain.
#[derive(Debug)]
pub struct DomainError {
    pub domain: Domain,
    pub error: CollectError,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.domain, self.error)
    }
}

/// Aggregated per-domain failures of one snapshot.
///
/// A non-empty value next to valid data means the data is partial, not invalid.
#[derive(Debug, Default)]
pub struct CollectErrors {
    errors: Vec<DomainError>,
}

impl CollectErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, domain: Domain, error: CollectError) {
        self.errors.push(DomainError { domain, error });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainError> {
        self.errors.iter()
    }

    /// Error recorded for `domain`, if that domain failed.
    pub fn failed(&self, domain: Domain) -> Option<&CollectError> {
        self.errors
            .iter()
            .find(|e| e.domain == domain)
            .map(|e| &e.error)
    }

    /// True when at least one domain was stopped by cancellation or deadline.
    pub fn is_cancelled(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.error.kind() == ErrorKind::Cancelled)
    }
}

impl fmt::Display for CollectErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("no collection errors");
        }
        for (idx, err) in self.errors.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for CollectErrors {}
