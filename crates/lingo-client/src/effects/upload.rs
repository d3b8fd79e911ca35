use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{Params, ProcessStatus, UploadResponse};
use crate::effects::client::Client;
use crate::error::{Error, Result};

/// Uploads translation files and waits for the import to finish.
#[derive(Clone, Debug)]
pub struct Uploader {
    client: Client,
}

impl Uploader {
    pub fn new(client: Client) -> Self { Self { client } }

    /// Upload the file named by `params["filename"]` and poll the resulting
    /// import process until it finishes. Returns the process id.
    ///
    /// `params` is sent as the request body. When it has no `data` field the
    /// file is read and base64-encoded into one; a caller-supplied `data`
    /// must already be a base64 string.
    pub async fn upload(&self, cancel: &CancellationToken, params: &Params) -> Result<String> {
        self.try_upload(cancel, params).await.map_err(|e| e.context("upload"))
    }

    async fn try_upload(&self, cancel: &CancellationToken, params: &Params) -> Result<String> {
        let mut body = params.clone();

        let path = match body.get("filename") {
            None => return Err(Error::InvalidInput("missing 'filename' param".into())),
            Some(Value::String(name)) if !name.trim().is_empty() => PathBuf::from(name),
            Some(_) => return Err(Error::InvalidInput("'filename' must be a non-empty string".into())),
        };

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::from(e).context(format!("stat {}", path.display())))?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!("{} is not a regular file", path.display())));
        }

        match body.get("data") {
            None => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| Error::from(e).context(format!("read {}", path.display())))?;
                body.insert("data".into(), Value::String(STANDARD.encode(bytes)));
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(Error::InvalidInput(format!(
                    "'data' must be a base64 string, got {}",
                    json_type(other)
                )));
            }
        }

        let response: UploadResponse = self
            .client
            .request(cancel, "request", Method::POST, &["files", "upload"], Some(&body))
            .await?;
        let process_id = response
            .process
            .map(|p| p.process_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::EmptyResponseField("process id"))?;
        debug!(process_id = %process_id, file = %path.display(), "upload queued");

        let results = self
            .client
            .poll_processes(cancel, &[process_id.as_str()])
            .await
            .map_err(|e| e.context("poll processes"))?;

        match results.into_iter().next() {
            Some(process) if process.status == ProcessStatus::Finished => Ok(process_id),
            Some(process) => Err(Error::ProcessNotFinished {
                process_id,
                status: process.status,
            }),
            None => Err(Error::ProcessNotFinished {
                process_id,
                status: ProcessStatus::Queued,
            }),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
