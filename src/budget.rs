//! Shared cancellation and deadline budget for one snapshot.
//!
//! Every collector polls [`Budget::check`] at each line or row boundary, so an
//! expired deadline stops a parse midway instead of only blocking new calls.
//! A blocking `read(2)` or `statvfs(2)` that never returns (wedged NFS mount)
//! is not interrupted; the deadline only takes effect once the call returns.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::CollectError;

#[derive(Debug, Clone)]
pub struct Budget {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Budget {
    /// Never expires unless the token is cancelled.
    pub fn unbounded() -> Self {
        Self::from_token(CancellationToken::new())
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(CancellationToken::new(), Instant::now() + timeout)
    }

    pub fn with_deadline(token: CancellationToken, deadline: Instant) -> Self {
        Self {
            token,
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns `Err(CollectError::Cancelled)` once cancelled or past the deadline.
    pub fn check(&self) -> Result<(), CollectError> {
        if self.is_expired() {
            return Err(CollectError::Cancelled);
        }
        Ok(())
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_unbounded_budget_passes() {
        let budget = Budget::unbounded();
        assert!(budget.check().is_ok());
        assert!(budget.remaining().is_none());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let budget = Budget::unbounded();
        let clone = budget.clone();
        clone.cancel();
        assert_eq!(
            budget.check().map_err(|e| e.kind()),
            Err(ErrorKind::Cancelled)
        );
    }

    #[test]
    fn test_elapsed_deadline_expires() {
        let budget = Budget::with_deadline(CancellationToken::new(), Instant::now());
        assert!(budget.is_expired());
        assert_eq!(budget.remaining(), Some(Duration::ZERO));
    }
}
