use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid or truncated zip archive: {reason}")]
    InvalidArchive { reason: String },

    #[error("zip too many files: {count} (limit {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("zip entry too big: {name} ({size} bytes, limit {max})")]
    EntryTooBig { name: String, size: u64, max: u64 },

    #[error("zip too large uncompressed: {total} bytes (limit {max})")]
    ArchiveTooLarge { total: u64, max: u64 },

    #[error("unsafe path in zip: {entry:?} resolves to '{}'", resolved.display())]
    UnsafePath { entry: String, resolved: PathBuf },

    #[error("symlink target escapes base directory: '{}' -> '{}'", target.display(), resolved.display())]
    SymlinkEscape { target: PathBuf, resolved: PathBuf },

    #[error("symlink target is absolute path: '{}' in '{}'", target.display(), symlink.display())]
    AbsoluteSymlinkTarget { target: PathBuf, symlink: PathBuf },

    #[error("entry path contains null byte")]
    InvalidPath,

    #[error("failed to extract '{}': {source}", path.display())]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create symlink '{}': {source}", link.display())]
    SymlinkCreationFailed {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },

    #[error("failed to create directory: {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The archive could not be read as ZIP at all. Callers that just
    /// downloaded the file usually want to fetch it again.
    pub fn is_invalid_archive(&self) -> bool { matches!(self, Self::InvalidArchive { .. }) }

    /// Limits and path checks. These never succeed on a retry.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Self::TooManyFiles { .. }
                | Self::EntryTooBig { .. }
                | Self::ArchiveTooLarge { .. }
                | Self::UnsafePath { .. }
                | Self::SymlinkEscape { .. }
                | Self::AbsoluteSymlinkTarget { .. }
                | Self::InvalidPath
        )
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Self::InvalidArchive {
            reason: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
