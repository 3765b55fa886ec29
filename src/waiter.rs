//! Monotonic wait primitive
//!
//! A [`Clock`] is the time-source port: it tells the time and sleeps.
//! [`MonotonicWaiter`] turns one clock sleep into a one-shot, cancellable wait
//! that reports cancellation as a value rather than an error.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::WaiterError;

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed
    Elapsed,
    /// The cancel signal fired first
    Cancelled,
}

/// Source of monotonic time
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Suspend for `duration`. Must not block the thread.
    async fn sleep(&self, duration: Duration) -> Result<(), WaiterError>;
}

/// Clock backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) -> Result<(), WaiterError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

/// Clock whose sleeps finish at once; for tests and dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateClock;

#[async_trait]
impl Clock for ImmediateClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, _duration: Duration) -> Result<(), WaiterError> {
        tokio::task::yield_now().await;
        Ok(())
    }
}

/// One-shot cancellable wait for a fixed duration.
///
/// A waiter is armed for a single phase. Once [`wait`](Self::wait) has been
/// called it is disposed and further calls fail with
/// [`WaiterError::Disposed`].
pub struct MonotonicWaiter {
    clock: Arc<dyn Clock>,
    duration: Duration,
    disposed: bool,
}

impl MonotonicWaiter {
    pub fn new(clock: Arc<dyn Clock>, duration: Duration) -> Self {
        Self {
            clock,
            duration,
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Wait until the duration elapses or `cancel` fires.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<WaitOutcome, WaiterError> {
        if self.disposed {
            return Err(WaiterError::Disposed);
        }
        self.disposed = true;

        if cancel.is_cancelled() {
            return Ok(WaitOutcome::Cancelled);
        }

        if self.duration.is_zero() {
            // Yield so a loop of zero-length phases still lets other tasks run.
            tokio::task::yield_now().await;
            return Ok(if cancel.is_cancelled() {
                WaitOutcome::Cancelled
            } else {
                WaitOutcome::Elapsed
            });
        }

        debug!("Waiting {:?}", self.duration);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(WaitOutcome::Cancelled),
            result = self.clock.sleep(self.duration) => result.map(|()| WaitOutcome::Elapsed),
        }
    }
}

impl std::fmt::Debug for MonotonicWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonotonicWaiter")
            .field("duration", &self.duration)
            .field("disposed", &self.disposed)
            .finish()
    }
}
