//! Per-request deadline and cancellation.

use crate::error::Error;
use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, sleep_until, Instant};

/// Lifetime of one logical request.
///
/// Network calls, body reads and backoff waits race the context; whichever
/// of deadline or cancellation fires first ends the request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every request holding the paired [`RequestContext`].
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl RequestContext {
    /// Context that never expires and cannot be cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Tighten the deadline to `now + timeout`; an earlier deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(at),
            None => at,
        });
        self
    }

    /// Attach a cancellation signal, replacing any previous one.
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Resolves with the reason once the context is done.
    async fn done(&self) -> Error {
        let cancelled = async {
            if let Some(rx) = &self.cancel {
                let mut rx = rx.clone();
                let fired = rx.wait_for(|c| *c).await.is_ok();
                if fired {
                    return;
                }
            }
            // Sender dropped without cancelling, or no signal attached.
            pending::<()>().await
        };
        let expired = async {
            match self.deadline {
                Some(at) => sleep_until(at).await,
                None => pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancelled => Error::Cancelled,
            _ = expired => Error::DeadlineExceeded,
        }
    }

    /// Reason the context is already done, without waiting.
    fn check(&self) -> Result<(), Error> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|at| at <= Instant::now()) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` unless the context finishes first. Work never starts on a
    /// context that is already done.
    pub(crate) async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Error> {
        self.check()?;
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }

    pub(crate) async fn sleep(&self, wait: Duration) -> Result<(), Error> {
        self.run(sleep(wait)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = RequestContext::background();
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn expired_deadline_short_circuits() {
        let ctx = RequestContext::background().with_timeout(Duration::ZERO);
        let out = ctx.run(async { 7 }).await;
        assert!(matches!(out, Err(Error::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn deadline_interrupts_sleep() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(20));
        let started = std::time::Instant::now();
        let out = ctx.sleep(Duration::from_secs(30)).await;
        assert!(matches!(out, Err(Error::DeadlineExceeded)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let (ctx, handle) = RequestContext::background().with_cancel();
        let waiter = tokio::spawn(async move { ctx.sleep(Duration::from_secs(30)).await });
        handle.cancel();
        let out = waiter.await.unwrap();
        assert!(matches!(out, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let (ctx, handle) = RequestContext::background().with_cancel();
        handle.cancel();
        let out = ctx.run(async { 7 }).await;
        assert!(matches!(out, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn dropped_handle_never_cancels() {
        let (ctx, handle) = RequestContext::background().with_cancel();
        drop(handle);
        assert!(ctx.sleep(Duration::from_millis(5)).await.is_ok());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }
}
