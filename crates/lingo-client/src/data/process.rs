use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side state of an asynchronous process.
///
/// Only [`ProcessStatus::Finished`] and [`ProcessStatus::Failed`] are
/// terminal. The service may report other states (e.g. `running`), which are
/// kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessStatus {
    #[default]
    Queued,
    Finished,
    Failed,
    Other(String),
}

impl ProcessStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Finished | Self::Failed) }
}

impl From<&str> for ProcessStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => Self::Queued,
            "finished" => Self::Finished,
            "failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for ProcessStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" | "finished" | "failed" => Self::from(s.as_str()),
            _ => Self::Other(s),
        }
    }
}

impl From<ProcessStatus> for String {
    fn from(status: ProcessStatus) -> Self {
        match status {
            ProcessStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Last observed state of a tracked process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedProcess {
    pub process_id: String,
    pub status: ProcessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set only once the process has finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl QueuedProcess {
    pub fn queued(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            status: ProcessStatus::Queued,
            message: None,
            download_url: None,
        }
    }

    pub fn is_finished(&self) -> bool { self.status == ProcessStatus::Finished }
}

/// `GET projects/{id}/processes/{process_id}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessResponse {
    #[serde(default)]
    process: Option<ProcessBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<ProcessDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessDetails {
    #[serde(default)]
    download_url: Option<String>,
}

impl ProcessResponse {
    /// Snapshot for `process_id`. The id is the one that was asked for, not
    /// whatever the body echoes back.
    pub(crate) fn into_process(self, process_id: &str) -> QueuedProcess {
        let body = self.process.unwrap_or_default();
        let status = ProcessStatus::from(body.status.unwrap_or_default());
        let download_url = body
            .details
            .and_then(|d| d.download_url)
            .filter(|url| !url.is_empty() && status == ProcessStatus::Finished);

        QueuedProcess {
            process_id: process_id.to_owned(),
            status,
            message: body.message.filter(|m| !m.is_empty()),
            download_url,
        }
    }
}

/// `POST projects/{id}/files/upload`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub process: Option<UploadProcess>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadProcess {
    #[serde(default)]
    pub process_id: String,
}

/// `POST projects/{id}/files/download`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DownloadBundle {
    #[serde(default)]
    pub bundle_url: String,
}

/// `POST projects/{id}/files/async-download`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsyncDownloadResponse {
    #[serde(default)]
    pub process_id: String,
}
