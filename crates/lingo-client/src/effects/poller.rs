//! Process poller: drives server-side jobs to a terminal state.

use std::collections::{HashMap, HashSet};

use reqwest::Method;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::{is_retryable, poll_sleep};
use crate::data::{ProcessResponse, ProcessStatus, QueuedProcess};
use crate::effects::client::Client;
use crate::error::{Error, Result};

impl Client {
    /// Poll `process_ids` until each reaches `finished` or `failed`, the
    /// client's polling ceiling elapses, or `cancel` fires.
    ///
    /// Ids are trimmed and blank ones dropped. The result has one entry per
    /// remaining id, in input order, duplicates included. Ids still pending when the ceiling elapses keep
    /// their last observed status. Cancellation discards everything and
    /// returns [`Error::Cancelled`].
    ///
    /// Each id is fetched on its own through the retry controller. A fetch
    /// that still fails after retrying is skipped for the round, unless the
    /// service answered with a non-retryable error, in which case that id is
    /// marked [`ProcessStatus::Failed`] and its siblings carry on.
    pub async fn poll_processes<S: AsRef<str>>(
        &self,
        cancel: &CancellationToken,
        process_ids: &[S],
    ) -> Result<Vec<QueuedProcess>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let order: Vec<&str> = process_ids
            .iter()
            .map(|id| id.as_ref().trim())
            .filter(|id| !id.is_empty())
            .collect();

        let mut seen = HashSet::new();
        let mut pending: Vec<&str> = order.iter().copied().filter(|id| seen.insert(*id)).collect();
        let mut processes: HashMap<&str, QueuedProcess> =
            pending.iter().map(|id| (*id, QueuedProcess::queued(*id))).collect();

        let policy = self.options.poll;
        let started = Instant::now();
        let mut wait = policy.initial_wait;

        while !pending.is_empty() && started.elapsed() < policy.max_wait {
            let mut still_pending = Vec::with_capacity(pending.len());

            for id in pending {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                match self.fetch_process(cancel, id).await {
                    Ok(process) => {
                        trace!(process_id = id, status = %process.status, "polled process");
                        let done = process.status.is_terminal();
                        processes.insert(id, process);
                        if !done {
                            still_pending.push(id);
                        }
                    }
                    Err(e) if e.is_cancelled() => return Err(Error::Cancelled),
                    Err(e) => match e.api_error() {
                        Some(api) if !is_retryable(&e) => {
                            debug!(process_id = id, error = %api, "process failed permanently");
                            let failed = processes.entry(id).or_insert_with(|| QueuedProcess::queued(id));
                            failed.status = ProcessStatus::Failed;
                            failed.message = Some(api.to_string());
                        }
                        _ => {
                            debug!(process_id = id, error = %e, "poll failed, retrying next round");
                            still_pending.push(id);
                        }
                    },
                }
            }

            pending = still_pending;
            if pending.is_empty() {
                break;
            }

            let Some(sleep) = poll_sleep(wait, started.elapsed(), policy.max_wait) else {
                break;
            };
            debug!(pending = pending.len(), ?sleep, "waiting for next poll round");
            tokio::select! {
                () = tokio::time::sleep(sleep) => {}
                () = cancel.cancelled() => return Err(Error::Cancelled),
            }
            wait = wait.saturating_mul(2);
        }

        Ok(order
            .iter()
            .map(|id| processes.get(id).cloned().unwrap_or_else(|| QueuedProcess::queued(*id)))
            .collect())
    }

    /// One status lookup, retried per the client's policy.
    pub async fn fetch_process(&self, cancel: &CancellationToken, process_id: &str) -> Result<QueuedProcess> {
        let response: ProcessResponse = self
            .request(cancel, "poll process", Method::GET, &["processes", process_id], None::<&()>)
            .await?;
        Ok(response.into_process(process_id))
    }
}
