use std::time::Duration;

use rand::Rng;

/// Base substituted by [`jittered_backoff`] when it is handed a zero delay.
pub const DEFAULT_JITTER_BASE: Duration = Duration::from_millis(300);

/// Randomize `base` by ±50%.
///
/// The result is uniform in `[base/2, base/2 + base)`. A zero `base` is
/// treated as [`DEFAULT_JITTER_BASE`].
///
/// ```
/// use std::time::Duration;
/// use lingo_client::core::jittered_backoff;
///
/// let base = Duration::from_millis(400);
/// let delay = jittered_backoff(base);
/// assert!(delay >= base / 2 && delay < base / 2 + base);
/// ```
pub fn jittered_backoff(base: Duration) -> Duration {
    let base = if base.is_zero() { DEFAULT_JITTER_BASE } else { base };
    let nanos = u64::try_from(base.as_nanos()).unwrap_or(u64::MAX);
    let offset = rand::rng().random_range(0..nanos);
    Duration::from_nanos(nanos / 2).saturating_add(Duration::from_nanos(offset))
}

/// Double `current`, capped at `max`.
pub fn next_backoff(current: Duration, max: Duration) -> Duration { current.saturating_mul(2).min(max) }

/// Sleep before the next polling round, or `None` once the ceiling is spent.
///
/// The sleep never carries the elapsed time past `ceiling`.
pub fn poll_sleep(wait: Duration, elapsed: Duration, ceiling: Duration) -> Option<Duration> {
    let remaining = ceiling.saturating_sub(elapsed);
    if remaining.is_zero() {
        return None;
    }
    Some(wait.min(remaining))
}
