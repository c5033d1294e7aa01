//! Execution Context
//!
//! Carried through one set execution. Holds the request id for tracing, an
//! optional deadline and a cancellation token. Every store interaction is
//! raced against both.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use super::errors::{ExecError, ExecResult};

/// Cooperative cancellation shared between a caller and an execution
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every execution holding a clone of this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent cancel is not missed
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Context carried through one set execution
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Request ID for tracing
    pub request_id: Uuid,

    /// Point after which the execution fails with `DeadlineExceeded`
    deadline: Option<Instant>,

    cancel: CancelToken,

    /// Start time for duration tracking
    started_at: Instant,
}

impl ExecutionContext {
    /// Context with a fresh request id, no deadline and its own token
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            deadline: None,
            cancel: CancelToken::new(),
            started_at: Instant::now(),
        }
    }

    /// Fail the execution once `timeout` has elapsed from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Share `token` with the caller so it can cancel the execution
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    /// Fail fast if the execution was cancelled or ran out of time
    pub fn check(&self) -> ExecResult<()> {
        if self.cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }
        if self.deadline.map_or(false, |d| Instant::now() >= d) {
            return Err(ExecError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `fut` unless cancellation or the deadline comes first
    pub async fn run<F>(&self, fut: F) -> ExecResult<F::Output>
    where
        F: Future,
    {
        self.check()?;

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExecError::Cancelled),
            _ = sleep_until(self.deadline) => Err(ExecError::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancel_before_run() {
        let token = CancelToken::new();
        let ctx = ExecutionContext::new().with_cancel(token.clone());
        token.cancel();

        assert!(matches!(ctx.run(async { 7 }).await, Err(ExecError::Cancelled)));
        assert!(matches!(ctx.check(), Err(ExecError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_during_run() {
        let token = CancelToken::new();
        let ctx = ExecutionContext::new().with_cancel(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(ExecError::Cancelled)));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(ExecError::DeadlineExceeded)));
    }

    #[test]
    fn test_fresh_request_ids() {
        assert_ne!(
            ExecutionContext::new().request_id,
            ExecutionContext::new().request_id
        );
    }
}
