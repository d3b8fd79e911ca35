use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::{is_retryable_with, jittered_backoff, next_backoff};
use crate::data::RetryPolicy;
use crate::error::{Error, Result};

/// Run `op` until it succeeds, fails terminally, runs out of retries or is
/// cancelled.
///
/// `op` receives the zero-based attempt number. Errors are classified with
/// [`is_retryable_with`] using the policy's `retry_cancelled` flag.
pub async fn with_exp_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let retry_cancelled = policy.retry_cancelled;
    with_exp_backoff_if(policy, cancel, label, op, |e| is_retryable_with(e, retry_cancelled)).await
}

/// [`with_exp_backoff`] with a caller-supplied retry predicate.
///
/// A terminal error comes back wrapped in [`Error::Context`] with `label`;
/// running out of retries yields [`Error::RetriesExhausted`] carrying the
/// number of attempts made. Cancellation is checked before every attempt and
/// interrupts the sleep between attempts, but never an attempt in flight.
pub async fn with_exp_backoff_if<T, F, Fut, P>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    mut op: F,
    should_retry: P,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled.context(label));
        }

        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !should_retry(&err) {
            debug!(label, attempt, error = %err, "not retrying");
            return Err(err.context(label));
        }
        if attempt >= policy.max_retries {
            warn!(label, attempts = attempt + 1, error = %err, "retries exhausted");
            return Err(Error::RetriesExhausted {
                label: label.to_owned(),
                attempts: attempt + 1,
                source: Box::new(err),
            });
        }

        let delay = jittered_backoff(backoff).min(policy.max_backoff);
        debug!(label, attempt, ?delay, error = %err, "retrying");

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return Err(Error::Cancelled.context(label)),
        }

        backoff = next_backoff(backoff, policy.max_backoff);
        attempt += 1;
    }
}
