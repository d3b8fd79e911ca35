//! Client for exchanging translation bundles with a translation-management
//! service.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and wire types
//! - [`core`] - Pure decisions (backoff math, error classification)
//! - [`effects`] - I/O operations (HTTP, retries, polling, extraction)
//!
//! # Key Features
//!
//! - **Retry Controller**: jittered exponential backoff, interruptible by a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Typed Errors**: service errors surface as [`ApiError`] values that can
//!   be inspected through any amount of call-site context
//! - **Process Poller**: tracks several server-side jobs at once and keeps
//!   polling siblings when one of them fails
//! - **Safe Extraction**: bundles are validated and unpacked through
//!   `lingo-archive`, so no entry can land outside the destination
//!
//! # Example
//!
//! ```no_run
//! use lingo_client::{Client, Params};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> lingo_client::Result<()> {
//! let client = Client::builder("api-token", "123.abc").build()?;
//! let cancel = CancellationToken::new();
//!
//! let mut params = Params::new();
//! params.insert("format".into(), "json".into());
//! let url = client.downloader().download(&cancel, "locales", &params).await?;
//! println!("downloaded {url}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{ClientOptions, Params, PollPolicy, ProcessStatus, QueuedProcess, RetryPolicy};
pub use effects::{Client, ClientBuilder, Downloader, Uploader, with_exp_backoff, with_exp_backoff_if};
pub use error::{Error, Result};
pub use lingo_apierr::ApiError;
pub use lingo_archive::{ExtractionPolicy, ExtractionReport};
