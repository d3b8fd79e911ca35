//! Request executor: one HTTP exchange with the JSON API.

use bytes::Bytes;
use futures_util::StreamExt;
use lingo_apierr::ApiError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::effects::client::Client;
use crate::effects::retry::with_exp_backoff;
use crate::error::Result;

/// How much of an error body is read before parsing it.
pub const ERROR_BODY_CAP: usize = 8192;

const API_TOKEN_HEADER: &str = "X-Api-Token";
const JSON: &str = "application/json";

impl Client {
    /// Call `projects/{id}/{path...}` with retries.
    ///
    /// The body is serialized once and the same bytes are sent on every
    /// attempt.
    pub async fn request<T, B>(
        &self,
        cancel: &CancellationToken,
        label: &str,
        method: Method,
        path: &[&str],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.options.project_url(path)?;
        let payload = body.map(serde_json::to_vec).transpose()?.map(Bytes::from);

        with_exp_backoff(&self.options.retry, cancel, label, |attempt| {
            trace!(%method, url = %url, attempt, "sending request");
            self.execute(method.clone(), url.as_str(), payload.clone())
        })
        .await
    }

    /// Perform a single attempt against an absolute `url`. No retries.
    ///
    /// Non-2xx responses become [`ApiError`]s with the response headers
    /// attached; 2xx bodies are decoded as `T`.
    pub async fn execute<T: DeserializeOwned>(&self, method: Method, url: &str, body: Option<Bytes>) -> Result<T> {
        let mut request = self
            .http
            .request(method, url)
            .header(API_TOKEN_HEADER, &self.options.token)
            .header(USER_AGENT, &self.options.user_agent)
            .header(ACCEPT, JSON);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, JSON).body(body);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await.into());
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Turn a non-2xx response into an [`ApiError`], reading at most
/// [`ERROR_BODY_CAP`] bytes of its body.
pub(crate) async fn api_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let headers = response.headers().clone();

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(Ok(chunk)) = stream.next().await {
        let room = ERROR_BODY_CAP - body.len();
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if body.len() >= ERROR_BODY_CAP {
            break;
        }
    }

    lingo_apierr::parse(&body, status).with_headers(headers)
}
