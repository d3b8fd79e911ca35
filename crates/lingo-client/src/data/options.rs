use std::fmt;
use std::time::Duration;

use lingo_archive::ExtractionPolicy;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.lokalise.com/api2/";
pub const DEFAULT_USER_AGENT: &str = "lingo/0.1";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(400);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INITIAL_WAIT: Duration = Duration::from_secs(1);
pub const DEFAULT_POLL_MAX_WAIT: Duration = Duration::from_secs(120);

/// Retry schedule for a single logical operation.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lingo_client::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .max_retries(5)
///     .backoff(Duration::from_millis(100), Duration::from_secs(2));
/// assert_eq!(policy.max_retries, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one. Zero disables retrying.
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Base delay before the first retry. Doubles after every retry.
    ///
    /// Default: 400ms
    pub initial_backoff: Duration,

    /// Upper bound for both the base delay and each jittered sleep.
    ///
    /// Default: 5s
    pub max_backoff: Duration,

    /// Whether a cancelled operation counts as retryable.
    ///
    /// Default: false
    pub retry_cancelled: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            retry_cancelled: false,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Zero durations are taken literally.
    #[must_use]
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    #[must_use]
    pub fn retry_cancelled(mut self, yes: bool) -> Self {
        self.retry_cancelled = yes;
        self
    }
}

/// Wait schedule between polling rounds.
///
/// `max_wait` is the overall ceiling for one polling call, not the longest
/// single sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_wait: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_wait: DEFAULT_POLL_INITIAL_WAIT,
            max_wait: DEFAULT_POLL_MAX_WAIT,
        }
    }
}

impl PollPolicy {
    /// Zero durations fall back to the defaults and `max` is raised to
    /// `initial` when smaller.
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial_wait = if initial.is_zero() {
            DEFAULT_POLL_INITIAL_WAIT
        } else {
            initial
        };
        let max_wait = if max.is_zero() { DEFAULT_POLL_MAX_WAIT } else { max };
        Self {
            initial_wait,
            max_wait: max_wait.max(initial_wait),
        }
    }
}

/// Resolved client configuration.
#[derive(Clone)]
pub struct ClientOptions {
    /// Always ends with `/`.
    pub base_url: String,
    pub token: String,
    pub project_id: String,
    pub user_agent: String,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub poll: PollPolicy,
    pub extraction: ExtractionPolicy,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("user_agent", &self.user_agent)
            .field("http_timeout", &self.http_timeout)
            .field("retry", &self.retry)
            .field("poll", &self.poll)
            .field("extraction", &self.extraction)
            .finish()
    }
}

impl ClientOptions {
    /// `{base_url}projects/{project_id}/{segments...}`, each segment
    /// percent-encoded so ids cannot reshape the path.
    pub fn project_url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || Error::InvalidConfig(format!("base URL {:?} cannot carry a path", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .push("projects")
            .push(&self.project_id)
            .extend(segments);
        Ok(url)
    }
}

/// Validate a base URL and make sure its path ends with `/`.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidConfig("base URL cannot be empty".into()));
    }

    let mut url = Url::parse(raw).map_err(|e| Error::InvalidConfig(format!("invalid base URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidConfig(format!("invalid base URL {raw:?}: missing host")));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.into())
}
