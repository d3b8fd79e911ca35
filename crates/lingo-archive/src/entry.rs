use std::path::PathBuf;

const S_IFMT: u32 = 0o170000;
const S_IFSOCK: u32 = 0o140000;
const S_IFLNK: u32 = 0o120000;
const S_IFBLK: u32 = 0o060000;
const S_IFDIR: u32 = 0o040000;
const S_IFCHR: u32 = 0o020000;
const S_IFIFO: u32 = 0o010000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Device, FIFO or socket. Never extracted.
    Special,
}

impl EntryKind {
    /// Classify an entry from its directory flag and stored Unix mode.
    ///
    /// Entries without type bits (typical for archives built on Windows)
    /// are regular files unless flagged as directories.
    pub fn classify(is_dir: bool, mode: Option<u32>) -> Self {
        if is_dir {
            return Self::Directory;
        }
        match mode.map(|m| m & S_IFMT) {
            Some(S_IFDIR) => Self::Directory,
            Some(S_IFLNK) => Self::Symlink,
            Some(S_IFCHR | S_IFBLK | S_IFIFO | S_IFSOCK) => Self::Special,
            _ => Self::File,
        }
    }
}

/// An entry that made it past the size and path checks.
#[derive(Clone, Debug)]
pub struct Entry {
    pub original_path: String,
    pub target_path: PathBuf,
    pub size: u64,
    pub mode: Option<u32>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_file(&self) -> bool { matches!(self.kind, EntryKind::File) }

    pub fn is_directory(&self) -> bool { matches!(self.kind, EntryKind::Directory) }

    pub fn is_symlink(&self) -> bool { matches!(self.kind, EntryKind::Symlink) }
}

/// Outcome of a successful extraction.
#[derive(Clone, Debug, Default)]
pub struct ExtractionReport {
    /// Entries written to disk, in archive order.
    pub entries: Vec<Entry>,
    /// Names of entries that were skipped by policy.
    pub skipped: Vec<String>,
    /// Bytes actually written for regular files.
    pub total_bytes: u64,
}

impl ExtractionReport {
    pub fn file_count(&self) -> usize { self.entries.iter().filter(|e| e.is_file()).count() }

    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_directory()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_directory_flag_wins() {
        assert_eq!(EntryKind::classify(true, Some(0o100644)), EntryKind::Directory);
        assert_eq!(EntryKind::classify(false, Some(0o040755)), EntryKind::Directory);
    }

    #[test]
    fn classify_regular() {
        assert_eq!(EntryKind::classify(false, Some(0o100644)), EntryKind::File);
        assert_eq!(EntryKind::classify(false, None), EntryKind::File);
        assert_eq!(EntryKind::classify(false, Some(0o644)), EntryKind::File);
    }

    #[test]
    fn classify_symlink() {
        assert_eq!(EntryKind::classify(false, Some(0o120777)), EntryKind::Symlink);
    }

    #[test]
    fn classify_special() {
        for mode in [0o020644, 0o060644, 0o010644, 0o140755] {
            assert_eq!(EntryKind::classify(false, Some(mode)), EntryKind::Special, "{mode:o}");
        }
    }

    #[test]
    fn report_counts() {
        let entry = |kind| Entry {
            original_path: "x".into(),
            target_path: PathBuf::from("/tmp/x"),
            size: 0,
            mode: None,
            kind,
        };
        let report = ExtractionReport {
            entries: vec![entry(EntryKind::File), entry(EntryKind::Directory), entry(EntryKind::File)],
            skipped: vec!["link".into()],
            total_bytes: 0,
        };
        assert_eq!(report.file_count(), 2);
        assert_eq!(report.directory_count(), 1);
    }
}
