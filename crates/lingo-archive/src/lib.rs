//! ZIP validation and extraction for untrusted bundles.
//!
//! # Architecture
//!
//! - `policy.rs` - Extraction limits and permission resolution
//! - `sanitize.rs` - Entry name normalization (zip-slip prevention)
//! - `entry.rs` - Entry classification and the extraction report
//! - `extract.rs` - [`validate`] and [`unzip`]

pub use entry::{Entry, EntryKind, ExtractionReport};
pub use error::{Error, Result};
pub use extract::{unzip, validate};
pub use policy::{ExtractionPolicy, resolve_permissions};
pub use sanitize::{
    SanitizedPath, ensure_no_linked_ancestor, normalize_entry_name, sanitize_entry_path, sanitize_symlink_target,
};

mod entry;
mod error;
mod extract;
mod policy;
mod sanitize;
