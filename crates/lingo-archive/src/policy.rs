/// Fallback mode for regular files whose entry carries no permission bits.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Limits and switches applied while extracting an archive.
///
/// The defaults are conservative: 20 000 entries, 2 GiB uncompressed in
/// total, 512 MiB for any single entry, no symlinks, no timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionPolicy {
    pub max_files: usize,
    pub max_total_bytes: u64,
    pub max_file_bytes: u64,
    pub allow_symlinks: bool,
    pub preserve_timestamps: bool,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            max_files: 20_000,
            max_total_bytes: 2 << 30,
            max_file_bytes: 512 << 20,
            allow_symlinks: false,
            preserve_timestamps: false,
        }
    }
}

impl ExtractionPolicy {
    #[must_use]
    pub fn max_files(mut self, n: usize) -> Self {
        self.max_files = n;
        self
    }

    #[must_use]
    pub fn max_total_bytes(mut self, bytes: u64) -> Self {
        self.max_total_bytes = bytes;
        self
    }

    #[must_use]
    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    #[must_use]
    pub fn allow_symlinks(mut self, allow: bool) -> Self {
        self.allow_symlinks = allow;
        self
    }

    #[must_use]
    pub fn preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }
}

/// Resolve the mode for an extracted regular file (pure function).
///
/// Only the permission bits of the stored mode are kept; an entry without
/// any falls back to [`DEFAULT_FILE_MODE`].
pub fn resolve_permissions(mode: Option<u32>) -> u32 {
    match mode.map(|m| m & 0o777) {
        Some(0) | None => DEFAULT_FILE_MODE,
        Some(perm) => perm,
    }
}
