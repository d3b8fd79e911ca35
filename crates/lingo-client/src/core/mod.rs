//! Pure decisions: backoff arithmetic and error classification.
//!
//! Nothing here sleeps or touches the network, so the effects layer can be
//! reasoned about as "do I/O, ask core what to do next".

mod classify;
mod retry;

pub use classify::{is_rate_limited, is_retryable, is_retryable_with};
pub use retry::{DEFAULT_JITTER_BASE, jittered_backoff, next_backoff, poll_sleep};
