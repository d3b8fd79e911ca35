//! Typed API errors for the translation service client.
//!
//! # Architecture
//!
//! - `error.rs` - The [`ApiError`] value carried by every non-2xx response
//! - `parse.rs` - Decoding of error bodies in the shapes the service emits
//! - `status.rs` - Status code classification (retryable, rate limited)

mod error;
mod parse;
mod status;

pub use error::ApiError;
pub use parse::{coerce_int, parse};
pub use status::{RETRYABLE_STATUSES, is_rate_limited_status, is_retryable_status, status_text};
