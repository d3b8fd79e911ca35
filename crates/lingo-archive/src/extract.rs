//! ZIP validation and bounded extraction.
//!
//! # Platform Behavior
//!
//! **Unix**: stored permission bits are applied to regular files and symlink
//! entries can be materialized when the policy allows them.
//!
//! **Windows (non-Unix)**: permission bits are ignored and symlink entries are
//! always skipped.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;
use tracing::debug;
use zip::ZipArchive;

use crate::entry::{Entry, EntryKind, ExtractionReport};
use crate::error::{Error, Result};
use crate::policy::{ExtractionPolicy, resolve_permissions};
use crate::sanitize::{
    SanitizedPath, ensure_no_linked_ancestor, normalize_path, sanitize_entry_path, sanitize_symlink_target,
};

/// Longest symlink target read from an entry body.
const MAX_LINK_TARGET: u64 = 4096;

/// Check that `path` opens as a ZIP archive.
///
/// Every format or read failure surfaces as [`Error::InvalidArchive`], so a
/// caller can tell "download again" apart from "the file is not there".
pub fn validate(path: impl AsRef<Path>) -> Result<()> {
    let file = File::open(path.as_ref())?;
    ZipArchive::new(BufReader::new(file))?;
    Ok(())
}

/// Extract `archive` into `destination` under `policy`.
///
/// Entries are processed in archive order and the first violation aborts the
/// whole extraction. Entries already written stay on disk; callers that need
/// all-or-nothing semantics should extract into a scratch directory.
pub fn unzip(
    archive: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    policy: &ExtractionPolicy,
) -> Result<ExtractionReport> {
    let file = File::open(archive.as_ref())?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    let destination = destination.as_ref();
    ensure_directory(destination)?;
    let root = normalize_path(&std::path::absolute(destination)?);

    if zip.len() > policy.max_files {
        return Err(Error::TooManyFiles {
            count: zip.len(),
            max: policy.max_files,
        });
    }

    debug!(entries = zip.len(), destination = %root.display(), "extracting archive");

    let mut report = ExtractionReport::default();
    let mut declared_total = 0u64;

    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        let name = file.name().to_owned();
        let size = file.size();

        if size > policy.max_file_bytes {
            return Err(Error::EntryTooBig {
                name,
                size,
                max: policy.max_file_bytes,
            });
        }
        declared_total = declared_total.saturating_add(size);
        if declared_total > policy.max_total_bytes {
            return Err(Error::ArchiveTooLarge {
                total: declared_total,
                max: policy.max_total_bytes,
            });
        }

        let Some(sanitized) = sanitize_entry_path(&name, &root)? else {
            continue;
        };
        ensure_no_linked_ancestor(&sanitized, &root)?;

        let mode = file.unix_mode();
        let kind = EntryKind::classify(file.is_dir(), mode);

        match kind {
            EntryKind::Directory => ensure_directory(&sanitized.resolved)?,
            EntryKind::File => {
                let mtime = if policy.preserve_timestamps {
                    file.last_modified().and_then(to_system_time)
                } else {
                    None
                };
                let written = write_file(&mut file, &sanitized, mode, policy.max_file_bytes, mtime)?;
                report.total_bytes = report.total_bytes.saturating_add(written);
                if report.total_bytes > policy.max_total_bytes {
                    return Err(Error::ArchiveTooLarge {
                        total: report.total_bytes,
                        max: policy.max_total_bytes,
                    });
                }
            }
            EntryKind::Symlink if policy.allow_symlinks => {
                if !write_symlink(&mut file, &sanitized, &root)? {
                    report.skipped.push(name);
                    continue;
                }
            }
            EntryKind::Symlink | EntryKind::Special => {
                debug!(entry = %name, ?kind, "skipping entry");
                report.skipped.push(name);
                continue;
            }
        }

        report.entries.push(Entry {
            original_path: sanitized.original,
            target_path: sanitized.resolved,
            size,
            mode,
            kind,
        });
    }

    Ok(report)
}

fn write_file<R: Read>(
    reader: &mut R,
    entry: &SanitizedPath,
    mode: Option<u32>,
    max_bytes: u64,
    mtime: Option<SystemTime>,
) -> Result<u64> {
    let target = &entry.resolved;
    if let Some(parent) = target.parent() {
        ensure_directory(parent)?;
    }

    let failed = |source| Error::ExtractionFailed {
        path: target.clone(),
        source,
    };

    let mut out = create_file(target, resolve_permissions(mode)).map_err(failed)?;
    let written = copy_capped(reader, &mut out, max_bytes).map_err(failed)?;
    let Some(written) = written else {
        return Err(Error::EntryTooBig {
            name: entry.original.clone(),
            size: max_bytes.saturating_add(1),
            max: max_bytes,
        });
    };

    if let Some(mtime) = mtime {
        if let Err(e) = out.set_modified(mtime) {
            debug!(path = %target.display(), error = %e, "could not preserve modification time");
        }
    }

    Ok(written)
}

/// Copy at most `max` bytes. `Ok(None)` means the source had more to give,
/// whatever the entry header declared.
fn copy_capped<R: Read, W: io::Write>(reader: &mut R, writer: &mut W, max: u64) -> io::Result<Option<u64>> {
    let written = io::copy(&mut reader.by_ref().take(max), writer)?;
    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(0) => return Ok(Some(written)),
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> io::Result<File> {
    OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

/// Returns `false` when the platform cannot represent the link.
fn write_symlink<R: Read>(reader: &mut R, entry: &SanitizedPath, root: &Path) -> Result<bool> {
    let mut target = String::new();
    reader.by_ref().take(MAX_LINK_TARGET).read_to_string(&mut target)?;
    let target = PathBuf::from(target);

    sanitize_symlink_target(&target, &entry.resolved, root)?;

    if let Some(parent) = entry.resolved.parent() {
        ensure_directory(parent)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, &entry.resolved).map_err(|e| Error::SymlinkCreationFailed {
            target,
            link: entry.resolved.clone(),
            source: e,
        })?;
        Ok(true)
    }

    #[cfg(not(unix))]
    {
        debug!(entry = %entry.original, "symlinks are not supported on this platform");
        Ok(false)
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// ZIP timestamps carry no zone; they are taken as UTC.
fn to_system_time(dt: zip::DateTime) -> Option<SystemTime> {
    let date = NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))?;
    let datetime = date.and_hms_opt(u32::from(dt.hour()), u32::from(dt.minute()), u32::from(dt.second()))?;
    Some(SystemTime::from(datetime.and_utc()))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn copy_capped_within_limit() {
        let mut out = Vec::new();
        let written = copy_capped(&mut Cursor::new(b"hello"), &mut out, 5).unwrap();
        assert_eq!(written, Some(5));
        assert_eq!(out, b"hello");
    }

    #[test]
    fn copy_capped_stops_at_limit() {
        let mut out = Vec::new();
        let written = copy_capped(&mut Cursor::new(b"hello world"), &mut out, 5).unwrap();
        assert_eq!(written, None);
        assert_eq!(out, b"hello");
    }

    #[test]
    fn validate_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, b"PK\x03\x04 not really").unwrap();
        assert!(matches!(validate(&path), Err(Error::InvalidArchive { .. })));
    }

    #[test]
    fn validate_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(validate(dir.path().join("absent.zip")), Err(Error::Io(_))));
    }

    #[test]
    fn validate_accepts_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(&path, &[("en.json", "{}")]);
        validate(&path).unwrap();
    }

    #[test]
    fn too_many_files_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(&path, &[("a.json", "1"), ("b.json", "2"), ("c.json", "3")]);
        let dest = dir.path().join("out");

        let err = unzip(&path, &dest, &ExtractionPolicy::default().max_files(2)).unwrap_err();
        assert!(matches!(err, Error::TooManyFiles { count: 3, max: 2 }));
        assert!(!dest.join("a.json").exists());
    }

    #[test]
    fn total_limit_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(&path, &[("a.json", "aaaaaaaa"), ("b.json", "bbbbbbbb")]);
        let dest = dir.path().join("out");

        let policy = ExtractionPolicy::default().max_total_bytes(10);
        let err = unzip(&path, &dest, &policy).unwrap_err();
        assert!(matches!(err, Error::ArchiveTooLarge { total: 16, max: 10 }));
        // earlier entries are not rolled back
        assert!(dest.join("a.json").exists());
        assert!(!dest.join("b.json").exists());
    }

    #[test]
    fn timestamps_preserved_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        let stamp = zip::DateTime::from_date_and_time(2021, 3, 4, 5, 6, 8).unwrap();
        {
            let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
            let options = SimpleFileOptions::default().last_modified_time(stamp);
            zip.start_file("en.json", options).unwrap();
            zip.write_all(b"{}").unwrap();
            zip.finish().unwrap();
        }
        let dest = dir.path().join("out");

        unzip(&path, &dest, &ExtractionPolicy::default().preserve_timestamps(true)).unwrap();

        let modified = std::fs::metadata(dest.join("en.json")).unwrap().modified().unwrap();
        assert_eq!(modified, to_system_time(stamp).unwrap());
    }

    #[test]
    fn to_system_time_handles_leap_day() {
        let stamp = zip::DateTime::from_date_and_time(2020, 2, 29, 0, 0, 0).unwrap();
        assert!(to_system_time(stamp).is_some());
    }
}
