//! Deadline-bounded scope handed to [`Service::stop`](super::Service::stop).

use crate::error::{LifecycleError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shutdown scope for a single stop call
///
/// A scope either carries a fixed deadline, measured from the moment
/// shutdown began, or is unbounded. Either way it can be cancelled; the
/// orchestrator cancels it as soon as the stop call returns.
///
/// The deadline is advisory: the orchestrator waits for `stop` to return no
/// matter how long it takes. Well-behaved services watch
/// [`expired`](Self::expired) or wrap their work in [`run`](Self::run).
#[derive(Debug, Clone)]
pub struct ShutdownScope {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl ShutdownScope {
    /// A scope with no deadline
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// A scope that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn from_timeout(timeout: Option<Duration>) -> Self {
        match timeout {
            Some(timeout) => Self::with_timeout(timeout),
            None => Self::unbounded(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Cancel the scope early
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that fires when the scope is cancelled (not when the deadline passes)
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves once the deadline passes or the scope is cancelled
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = self.token.cancelled() => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Run `fut` to completion unless the scope runs out first
    pub async fn run<F>(&self, fut: F) -> Result<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            output = fut => Ok(output),
            _ = self.expired() => {
                if self.token.is_cancelled() {
                    Err(LifecycleError::ScopeCancelled)
                } else {
                    Err(LifecycleError::DeadlineExceeded)
                }
            }
        }
    }
}

impl Default for ShutdownScope {
    fn default() -> Self {
        Self::unbounded()
    }
}
