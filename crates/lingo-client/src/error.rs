//! Error types for lingo-client.

use std::io;

use lingo_apierr::ApiError;
use thiserror::Error;

use crate::data::ProcessStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("incomplete download: got {received} of {expected} bytes")]
    ShortRead { received: u64, expected: u64 },

    /// The downloaded file did not open as a ZIP archive.
    #[error("zip validate: {0}")]
    TruncatedArchive(#[source] lingo_archive::Error),

    #[error(transparent)]
    Archive(#[from] lingo_archive::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty {0} in response")]
    EmptyResponseField(&'static str),

    #[error("process {process_id} did not finish (status={status})")]
    ProcessNotFinished {
        process_id: String,
        status: ProcessStatus,
    },

    #[error("{label}: {source}")]
    Context {
        label: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{label}: giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        label: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap with an operation label. An empty label leaves the error as is.
    #[must_use]
    pub fn context(self, label: impl Into<String>) -> Self {
        let label = label.into();
        if label.is_empty() {
            return self;
        }
        Self::Context {
            label,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through [`Error::Context`] and
    /// [`Error::RetriesExhausted`].
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Self::Context { source, .. } | Self::RetriesExhausted { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self.root() {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool { matches!(self.root(), Self::Cancelled) }

    /// Number of attempts made when retries ran out.
    pub fn attempts(&self) -> Option<u32> {
        let mut current = self;
        loop {
            match current {
                Self::RetriesExhausted { attempts, .. } => return Some(*attempts),
                Self::Context { source, .. } => current = source.as_ref(),
                _ => return None,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_label() {
        let err = Error::Cancelled.context("download");
        assert_eq!(err.to_string(), "download: operation cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn empty_label_is_transparent() {
        let err = Error::Cancelled.context("");
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn api_error_found_through_wrappers() {
        let err = Error::RetriesExhausted {
            label: "request".into(),
            attempts: 4,
            source: Box::new(Error::Api(ApiError::new(503, "busy"))),
        }
        .context("upload");

        assert_eq!(err.api_error().map(|e| e.status), Some(503));
        assert_eq!(err.attempts(), Some(4));
        assert_eq!(err.to_string(), "upload: request: giving up after 4 attempts: busy");
    }

    #[test]
    fn attempts_absent_without_exhaustion() {
        let err = Error::Api(ApiError::new(422, "bad")).context("upload");
        assert_eq!(err.attempts(), None);
    }

    #[test]
    fn context_exposes_source() {
        let err = Error::Api(ApiError::new(404, "missing")).context("fetch bundle");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "missing");
    }
}
