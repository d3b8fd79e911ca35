use std::fmt;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

use crate::status::{is_rate_limited_status, is_retryable_status, status_text};

/// Structured form of a non-success response from the service.
///
/// `status` is the HTTP status of the response (`0` when the error did not
/// come from an HTTP exchange). `code` is the service-specific code, which
/// frequently mirrors `status` but is not required to.
#[derive(Debug, Clone, Default)]
pub struct ApiError {
    pub status: u16,
    pub code: i64,
    pub message: String,
    pub reason: String,
    pub details: Map<String, Value>,
    /// The response body, trimmed.
    pub raw: String,
    /// Headers of the failed response. The body has already been consumed.
    pub headers: Option<HeaderMap>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: i64::from(status),
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn is_retryable(&self) -> bool { is_retryable_status(self.status) }

    pub fn is_rate_limited(&self) -> bool { is_rate_limited_status(self.status) }

    /// Value of a response header, if the headers were captured and the value is text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(name))
            .and_then(|v| v.to_str().ok())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(status_text(self.status))
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for ApiError {}
