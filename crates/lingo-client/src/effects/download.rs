//! Export flows: obtain a bundle URL, fetch the ZIP, extract it.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use lingo_archive::{ExtractionPolicy, ExtractionReport};
use reqwest::Method;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, USER_AGENT};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::data::{AsyncDownloadResponse, DownloadBundle, Params, ProcessStatus};
use crate::effects::client::Client;
use crate::effects::http::api_error;
use crate::effects::retry::with_exp_backoff;
use crate::error::{Error, Result};

const ARCHIVE_ACCEPT: &str = "application/zip, application/octet-stream, */*";

/// Exports translation bundles and unpacks them into a directory.
#[derive(Clone, Debug)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self { Self { client } }

    /// Synchronous export: `files/download` returns the bundle URL directly.
    ///
    /// Returns the bundle URL that was downloaded.
    pub async fn download(&self, cancel: &CancellationToken, dest: impl AsRef<Path>, params: &Params) -> Result<String> {
        let url = self.fetch_bundle(cancel, params).await?;
        self.download_and_unzip(cancel, &url, dest).await?;
        Ok(url)
    }

    /// Asynchronous export: `files/async-download` queues a process that is
    /// polled until it yields a download URL.
    ///
    /// Returns the download URL that was used.
    pub async fn download_async(
        &self,
        cancel: &CancellationToken,
        dest: impl AsRef<Path>,
        params: &Params,
    ) -> Result<String> {
        let url = self.fetch_bundle_async(cancel, params).await?;
        self.download_and_unzip(cancel, &url, dest).await?;
        Ok(url)
    }

    pub async fn fetch_bundle(&self, cancel: &CancellationToken, params: &Params) -> Result<String> {
        let bundle: DownloadBundle = self
            .client
            .request(cancel, "request", Method::POST, &["files", "download"], Some(params))
            .await
            .map_err(|e| e.context("fetch bundle"))?;
        if bundle.bundle_url.trim().is_empty() {
            return Err(Error::EmptyResponseField("bundle url").context("fetch bundle"));
        }
        Ok(bundle.bundle_url)
    }

    pub async fn fetch_bundle_async(&self, cancel: &CancellationToken, params: &Params) -> Result<String> {
        let label = "fetch bundle async";
        let queued: AsyncDownloadResponse = self
            .client
            .request(cancel, "request", Method::POST, &["files", "async-download"], Some(params))
            .await
            .map_err(|e| e.context(label))?;
        let process_id = queued.process_id;
        if process_id.trim().is_empty() {
            return Err(Error::EmptyResponseField("process id").context(label));
        }

        let results = self
            .client
            .poll_processes(cancel, &[process_id.as_str()])
            .await
            .map_err(|e| e.context(format!("{label}: poll processes")))?;

        let Some(process) = results.into_iter().next() else {
            return Err(Error::ProcessNotFinished {
                process_id,
                status: ProcessStatus::Queued,
            }
            .context(label));
        };
        match process.download_url {
            Some(url) if process.status == ProcessStatus::Finished => Ok(url),
            _ => Err(Error::ProcessNotFinished {
                process_id,
                status: process.status,
            }
            .context(label)),
        }
    }

    /// Fetch the ZIP at `url` into a temporary file, retrying short or
    /// corrupt transfers, then extract it into `dest` under the client's
    /// extraction policy.
    pub async fn download_and_unzip(
        &self,
        cancel: &CancellationToken,
        url: &str,
        dest: impl AsRef<Path>,
    ) -> Result<ExtractionReport> {
        let dest = dest.as_ref();
        if url.trim().is_empty() {
            return Err(Error::InvalidInput("empty bundle url".into()).context("download"));
        }
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| Error::from(e).context(format!("download: create {}", dest.display())))?;

        let scratch = tempfile::Builder::new()
            .prefix("lingo-")
            .suffix(".zip")
            .tempfile()
            .map_err(|e| Error::from(e).context("download: create temp zip"))?;
        let archive = scratch.path();

        with_exp_backoff(&self.client.options.retry, cancel, "download", |attempt| async move {
            debug!(url, attempt, "downloading bundle");
            self.download_once(url, archive).await?;
            validate(archive.to_path_buf()).await
        })
        .await?;

        let report = unzip(archive.to_path_buf(), dest.to_path_buf(), self.client.options.extraction)
            .await
            .map_err(|e| e.context("unzip"))?;
        debug!(
            files = report.file_count(),
            skipped = report.skipped.len(),
            bytes = report.total_bytes,
            "bundle extracted"
        );
        Ok(report)
    }

    /// One GET of the bundle into `path`.
    async fn download_once(&self, url: &str, path: &Path) -> Result<()> {
        let response = self
            .client
            .http
            .get(url)
            .header(USER_AGENT, &self.client.options.user_agent)
            .header(ACCEPT_ENCODING, "identity")
            .header(ACCEPT, ARCHIVE_ACCEPT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let expected = response.content_length();
        let mut file = tokio::fs::File::create(path).await?;
        let mut received = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        match expected {
            Some(expected) if expected != received => Err(Error::ShortRead { received, expected }),
            _ => Ok(()),
        }
    }
}

/// A file that does not open as ZIP is reported as truncated so the
/// download is attempted again.
async fn validate(path: PathBuf) -> Result<()> {
    let outcome = tokio::task::spawn_blocking(move || lingo_archive::validate(&path))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.is_invalid_archive() => Err(Error::TruncatedArchive(e)),
        Err(e) => Err(Error::Archive(e)),
    }
}

async fn unzip(archive: PathBuf, dest: PathBuf, policy: ExtractionPolicy) -> Result<ExtractionReport> {
    tokio::task::spawn_blocking(move || lingo_archive::unzip(&archive, &dest, &policy))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
        .map_err(Error::Archive)
}
