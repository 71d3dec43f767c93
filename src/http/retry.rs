use super::Transport;
use crate::backoff::Backoff;
use crate::context::RequestContext;
use crate::error::{redact_keys, Error};
use log::debug;
use reqwest::{Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Called once per retry with the error that triggered it and the wait
/// before the next attempt.
pub type RetryNotify = Arc<dyn Fn(&Error, Duration) + Send + Sync>;

/// Whether a request may be sent more than once.
///
/// Non-idempotent requests get exactly one attempt so a create or update is
/// never duplicated on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    Idempotent,
    NonIdempotent,
}

/// A 2xx or 4xx response ends the retry loop; 4xx is turned into an error by
/// the response handler. 429 and anything else (1xx, 3xx, 5xx) is retried.
pub fn is_terminal_status(status: StatusCode) -> bool {
    status.is_success() || (status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS)
}

/// Sends requests over a transport, optionally retrying.
pub struct Executor<'a, T> {
    pub transport: &'a T,
    /// Scrubbed from transport errors before anyone sees them.
    pub secrets: &'a [&'a str],
    pub notify: Option<&'a RetryNotify>,
}

impl<T: Transport> Executor<'_, T> {
    /// Single attempt, no status classification.
    pub async fn send_once(
        &self,
        ctx: &RequestContext,
        request: Request,
    ) -> Result<Response, Error> {
        ctx.run(self.transport.execute(request))
            .await?
            .map_err(|e| redact_keys(Error::Transport(e), self.secrets))
    }

    /// Attempt until a terminal status, the backoff gives up, or the context
    /// ends. Attempts never overlap.
    pub async fn send_with_retries(
        &self,
        ctx: &RequestContext,
        request: Request,
        mut backoff: Box<dyn Backoff>,
    ) -> Result<Response, Error> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        let mut attempt: u32 = 1;
        loop {
            let next = request
                .try_clone()
                .ok_or_else(|| Error::Build("request body cannot be replayed".into()))?;
            let err = match self.send_once(ctx, next).await {
                Ok(resp) if is_terminal_status(resp.status()) => return Ok(resp),
                Ok(resp) => Error::UnexpectedStatus(resp.status()),
                Err(e @ (Error::Cancelled | Error::DeadlineExceeded)) => return Err(e),
                Err(e) => e,
            };
            let Some(wait) = backoff.next_backoff() else {
                debug!("{} {} giving up after {} attempts: {}", method, path, attempt, err);
                return Err(err);
            };
            debug!(
                "{} {} attempt {} failed: {}; retrying in {:?}",
                method, path, attempt, err, wait
            );
            if let Some(notify) = self.notify {
                notify(&err, wait);
            }
            ctx.sleep(wait).await?;
            attempt += 1;
        }
    }
}
