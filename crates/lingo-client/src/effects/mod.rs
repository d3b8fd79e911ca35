//! I/O: HTTP exchanges, sleeping between attempts, polling and disk.

mod client;
mod download;
mod http;
mod poller;
mod retry;
mod upload;

pub use client::{Client, ClientBuilder};
pub use download::Downloader;
pub use http::ERROR_BODY_CAP;
pub use retry::{with_exp_backoff, with_exp_backoff_if};
pub use upload::Uploader;
