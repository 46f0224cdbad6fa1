//! Deadlines and cancellation for provider operations and health probes.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// Why an operation stopped before completing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("deadline exceeded")]
    TimedOut,

    #[error("operation cancelled")]
    Cancelled,
}

/// An optional point in time plus a cancellation signal.
///
/// Cloning shares the cancellation token, so cancelling one clone interrupts
/// every operation running under any of them.
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for Deadline {
    fn default() -> Self {
        Self {
            at: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl Deadline {
    /// No time bound; only cancellation can interrupt.
    pub fn none() -> Self {
        Self::default()
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    /// A deadline at a fixed instant.
    pub fn at(instant: Instant) -> Self {
        Self {
            at: Some(instant),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A deadline no later than `timeout` from now, sharing this one's token.
    pub fn tighten(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let at = match self.at {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            at: Some(at),
            cancel: self.cancel.clone(),
        }
    }

    /// Time left before the deadline, or `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// True once the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The shared cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drive `fut` to completion unless the deadline passes or the token fires.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        match self.at {
            Some(at) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
                res = tokio::time::timeout_at(at, fut) => res.map_err(|_| Interrupted::TimedOut),
            },
            None => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
                out = fut => Ok(out),
            },
        }
    }
}

/// Run a provider operation under `deadline`.
///
/// An interruption becomes an `unavailable` error for `provider.operation`
/// with the [`Interrupted`] reason as its cause.
pub async fn guard<T, F>(
    provider: &str,
    operation: &str,
    deadline: &Deadline,
    fut: F,
) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match deadline.run(fut).await {
        Ok(result) => result,
        Err(interrupted) => {
            warn!(provider, operation, reason = %interrupted, "provider operation interrupted");
            Err(ProviderError::unavailable(
                provider,
                operation,
                Some(interrupted.into()),
            ))
        }
    }
}
