//! Cancellation scope for a test session.
//!
//! A [`TestScope`] pairs a [`CancellationToken`] with an optional deadline.
//! Child scopes inherit cancellation from their parent and never outlive the
//! parent's deadline.

use std::time::{Duration, Instant};

use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a scope is no longer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("scope canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct TestScope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl TestScope {
    /// A root scope with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// A root scope that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A root scope that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child scope bounded by both this scope's deadline and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let local = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) => parent.min(local),
            None => local,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this scope and every scope derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when the scope has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// `None` while the scope is live. Cancellation takes precedence over expiry.
    pub fn err(&self) -> Option<ScopeError> {
        if self.token.is_cancelled() {
            return Some(ScopeError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ScopeError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Guard that cancels this scope when dropped.
    pub fn cancel_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Token backing this scope, for integration with async code.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
