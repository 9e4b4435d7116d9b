//! Per-call moderation context
//!
//! Every provider call runs under a [`ModerationContext`]. The context carries
//! an optional deadline and a cancellation token; in-flight HTTP requests and
//! polling sleeps are abandoned as soon as either fires.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation for a single moderation call
#[derive(Debug, Clone, Default)]
pub struct ModerationContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl ModerationContext {
    /// Context with no deadline and a fresh cancellation token
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tie this context to an externally owned cancellation token
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The deadline, if any
    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Cancel every operation running under this context
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context is cancelled or past its deadline
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context fires first.
    ///
    /// Dropping the future on cancellation aborts any in-flight request it owns.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = deadline => Err(Error::DeadlineExceeded),
            out = fut => out,
        }
    }

    /// Sleep for `duration`, waking early with an error if the context fires
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}
