//! Immutable configuration and wire types.
//!
//! Nothing in here performs I/O; values are built once and passed by
//! reference into the effects layer.

pub mod options;
pub mod process;

pub use options::{
    ClientOptions, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF,
    DEFAULT_MAX_RETRIES, DEFAULT_POLL_INITIAL_WAIT, DEFAULT_POLL_MAX_WAIT, DEFAULT_USER_AGENT, PollPolicy,
    RetryPolicy, normalize_base_url,
};
pub use process::{ProcessStatus, QueuedProcess};

pub(crate) use process::{AsyncDownloadResponse, DownloadBundle, ProcessResponse, UploadResponse};

/// Caller-supplied JSON body fields for upload and download requests.
pub type Params = serde_json::Map<String, serde_json::Value>;
