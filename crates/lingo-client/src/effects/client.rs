use std::sync::Arc;
use std::time::Duration;

use lingo_archive::ExtractionPolicy;

use crate::data::{
    ClientOptions, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT, PollPolicy, RetryPolicy,
    normalize_base_url,
};
use crate::effects::download::Downloader;
use crate::effects::upload::Uploader;
use crate::error::{Error, Result};

/// Handle to the translation service.
///
/// Cheap to clone; clones share the underlying connection pool and
/// configuration.
#[derive(Clone, Debug)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) options: Arc<ClientOptions>,
}

impl Client {
    /// Start configuring a client for `project_id`, authenticated with `token`.
    pub fn builder(token: impl Into<String>, project_id: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(token, project_id)
    }

    pub fn options(&self) -> &ClientOptions { &self.options }

    pub fn uploader(&self) -> Uploader { Uploader::new(self.clone()) }

    pub fn downloader(&self) -> Downloader { Downloader::new(self.clone()) }
}

/// Builder for [`Client`].
///
/// Every setter takes its value literally except where documented. Nothing
/// is validated until [`ClientBuilder::build`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lingo_client::Client;
///
/// let client = Client::builder("token", "123.abc")
///     .base_url("https://api.example.com/api2")
///     .max_retries(5)
///     .poll_wait(Duration::from_millis(500), Duration::from_secs(60))
///     .build()
///     .unwrap();
/// assert_eq!(client.options().base_url, "https://api.example.com/api2/");
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    token: String,
    project_id: String,
    base_url: String,
    user_agent: String,
    http_timeout: Duration,
    http_client: Option<reqwest::Client>,
    retry: RetryPolicy,
    poll: PollPolicy,
    extraction: ExtractionPolicy,
}

impl ClientBuilder {
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            project_id: project_id.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            http_client: None,
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            extraction: ExtractionPolicy::default(),
        }
    }

    /// Must be an absolute URL with a host. A trailing slash is added.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Blank values are ignored.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl AsRef<str>) -> Self {
        let user_agent = user_agent.as_ref().trim();
        if !user_agent.is_empty() {
            self.user_agent = user_agent.to_owned();
        }
        self
    }

    /// Per-request timeout. Ignored when a client is supplied with
    /// [`ClientBuilder::http_client`].
    #[must_use]
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, n: u32) -> Self {
        self.retry = self.retry.max_retries(n);
        self
    }

    #[must_use]
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.retry = self.retry.backoff(initial, max);
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// See [`PollPolicy::new`] for how zero values are handled.
    #[must_use]
    pub fn poll_wait(mut self, initial: Duration, max: Duration) -> Self {
        self.poll = PollPolicy::new(initial, max);
        self
    }

    /// Treat cancellation as a transient failure. Off by default.
    #[must_use]
    pub fn retry_cancelled(mut self, yes: bool) -> Self {
        self.retry = self.retry.retry_cancelled(yes);
        self
    }

    #[must_use]
    pub fn extraction_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.extraction = policy;
        self
    }

    pub fn build(self) -> Result<Client> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(Error::InvalidConfig("token is required".into()));
        }
        let project_id = self.project_id.trim();
        if project_id.is_empty() {
            return Err(Error::InvalidConfig("project ID is required".into()));
        }
        let base_url = normalize_base_url(&self.base_url)?;

        let http = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(self.http_timeout)
                .build()
                .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?,
        };

        let options = ClientOptions {
            base_url,
            token: token.to_owned(),
            project_id: project_id.to_owned(),
            user_agent: self.user_agent,
            http_timeout: self.http_timeout,
            retry: self.retry,
            poll: self.poll,
            extraction: self.extraction,
        };

        Ok(Client {
            http,
            options: Arc::new(options),
        })
    }
}
