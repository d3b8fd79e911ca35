use std::error::Error as StdError;
use std::io;

use crate::error::Error;

/// Whether repeating the failed operation unchanged might succeed.
///
/// Cancellation is terminal here; see [`is_retryable_with`].
pub fn is_retryable(err: &Error) -> bool { is_retryable_with(err, false) }

/// Like [`is_retryable`], with cancellation treated as retryable when
/// `retry_cancelled` is set.
pub fn is_retryable_with(err: &Error, retry_cancelled: bool) -> bool {
    match err.root() {
        Error::Api(api) => api.is_retryable(),
        Error::Cancelled => retry_cancelled,
        Error::ShortRead { .. } | Error::TruncatedArchive(_) => true,
        Error::Transport(e) => e.is_timeout() || e.is_body() || has_flaky_io(e),
        Error::Io(e) => is_flaky_io(e) || has_flaky_io(e),
        _ => false,
    }
}

/// Whether the service asked us to slow down (HTTP 429).
pub fn is_rate_limited(err: &Error) -> bool { err.api_error().is_some_and(|e| e.is_rate_limited()) }

fn is_flaky_io(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
    )
}

/// Scan the source chain below `err` for a flaky I/O condition.
fn has_flaky_io(err: &(dyn StdError + 'static)) -> bool {
    let mut current = err.source();
    while let Some(e) = current {
        if e.downcast_ref::<io::Error>().is_some_and(is_flaky_io) {
            return true;
        }
        current = e.source();
    }
    false
}
