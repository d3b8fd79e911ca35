use std::fs::File;
use std::io::Write;
use std::path::Path;

use lingo_archive::{Error, ExtractionPolicy, unzip, validate};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

fn temp_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("lingo-test-zip-")
        .tempdir()
        .expect("Failed to create temp dir")
}

fn build_bundle(path: &Path, build: impl FnOnce(&mut ZipWriter<File>)) {
    let mut zip = ZipWriter::new(File::create(path).expect("Failed to create zip"));
    build(&mut zip);
    zip.finish().expect("Failed to finish zip");
}

fn add_file(zip: &mut ZipWriter<File>, name: &str, data: &[u8]) {
    zip.start_file(name, SimpleFileOptions::default()).unwrap();
    zip.write_all(data).unwrap();
}

#[test]
fn extracts_nested_tree() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| {
        zip.add_directory("locale/", SimpleFileOptions::default()).unwrap();
        add_file(zip, "locale/en.json", br#"{"hello":"Hello"}"#);
        add_file(zip, "locale/nested/fr.json", br#"{"hello":"Bonjour"}"#);
    });
    let dest = dir.path().join("out");

    let report = unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap();

    assert_eq!(report.file_count(), 2);
    assert_eq!(report.directory_count(), 1);
    assert_eq!(report.total_bytes, 36);
    assert!(report.skipped.is_empty());
    assert_eq!(
        std::fs::read_to_string(dest.join("locale/en.json")).unwrap(),
        r#"{"hello":"Hello"}"#
    );
    assert_eq!(
        std::fs::read_to_string(dest.join("locale/nested/fr.json")).unwrap(),
        r#"{"hello":"Bonjour"}"#
    );
}

#[test]
fn creates_missing_destination() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| add_file(zip, "en.json", b"{}"));
    let dest = dir.path().join("a/b/c");

    unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap();
    assert!(dest.join("en.json").is_file());
}

#[test]
fn rejects_zip_slip() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| add_file(zip, "../evil.txt", b"pwned"));
    let dest = dir.path().join("out");

    let err = unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap_err();

    assert!(matches!(err, Error::UnsafePath { .. }), "{err:?}");
    assert!(err.is_policy_violation());
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn leading_slash_lands_inside_destination() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| add_file(zip, "/locale/en.json", b"{}"));
    let dest = dir.path().join("out");

    unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap();
    assert!(dest.join("locale/en.json").is_file());
}

#[test]
fn oversized_entry_is_not_written() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| add_file(zip, "big.json", &[b'x'; 64]));
    let dest = dir.path().join("out");

    let policy = ExtractionPolicy::default().max_file_bytes(16);
    let err = unzip(&archive, &dest, &policy).unwrap_err();

    assert!(
        matches!(err, Error::EntryTooBig { size: 64, max: 16, .. }),
        "{err:?}"
    );
    assert!(!dest.join("big.json").exists());
}

/// Rewrite the uncompressed size of the only entry in both its local header
/// and its central directory record.
fn understate_size(archive: &Path, declared: u32) {
    let mut bytes = std::fs::read(archive).unwrap();
    assert_eq!(&bytes[..4], b"PK\x03\x04");
    bytes[22..26].copy_from_slice(&declared.to_le_bytes());
    let central = bytes
        .windows(4)
        .position(|w| w == b"PK\x01\x02")
        .expect("central directory record");
    bytes[central + 24..central + 28].copy_from_slice(&declared.to_le_bytes());
    std::fs::write(archive, bytes).unwrap();
}

#[test]
fn entry_larger_than_declared_is_stopped() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("en.json", options).unwrap();
        zip.write_all(b"0123456789abcdef").unwrap();
    });
    understate_size(&archive, 4);
    let dest = dir.path().join("out");

    let policy = ExtractionPolicy::default().max_file_bytes(8);
    let err = unzip(&archive, &dest, &policy).unwrap_err();

    assert!(matches!(err, Error::EntryTooBig { max: 8, .. }), "{err:?}");
    let written = std::fs::metadata(dest.join("en.json")).map(|m| m.len()).unwrap_or(0);
    assert!(written <= 8, "wrote {written} bytes");
}

#[test]
fn validate_rejects_truncated_archive() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    build_bundle(&archive, |zip| {
        add_file(zip, "en.json", br#"{"hello":"Hello"}"#);
        add_file(zip, "fr.json", br#"{"hello":"Bonjour"}"#);
    });
    validate(&archive).unwrap();

    let bytes = std::fs::read(&archive).unwrap();
    std::fs::write(&archive, &bytes[..bytes.len() / 2]).unwrap();

    let err = validate(&archive).unwrap_err();
    assert!(err.is_invalid_archive(), "{err:?}");
}

#[test]
fn truncated_archive_fails_extraction() {
    let dir = temp_dir();
    let archive = dir.path().join("bundle.zip");
    std::fs::write(&archive, b"definitely not a zip").unwrap();

    let err = unzip(&archive, dir.path().join("out"), &ExtractionPolicy::default()).unwrap_err();
    assert!(err.is_invalid_archive());
}

#[cfg(unix)]
mod unix {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    fn bundle_with_link(archive: &Path, target: &str) {
        build_bundle(archive, |zip| {
            add_file(zip, "locale/en.json", b"{}");
            zip.add_symlink("locale/current.json", target, SimpleFileOptions::default())
                .unwrap();
        });
    }

    #[test]
    fn symlinks_skipped_by_default() {
        let dir = temp_dir();
        let archive = dir.path().join("bundle.zip");
        bundle_with_link(&archive, "en.json");
        let dest = dir.path().join("out");

        let report = unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap();

        assert_eq!(report.skipped, vec!["locale/current.json".to_owned()]);
        assert!(std::fs::symlink_metadata(dest.join("locale/current.json")).is_err());
    }

    #[test]
    fn symlinks_created_when_allowed() {
        let dir = temp_dir();
        let archive = dir.path().join("bundle.zip");
        bundle_with_link(&archive, "en.json");
        let dest = dir.path().join("out");

        let policy = ExtractionPolicy::default().allow_symlinks(true);
        let report = unzip(&archive, &dest, &policy).unwrap();

        let link = dest.join("locale/current.json");
        assert!(report.entries.iter().any(|e| e.is_symlink()));
        assert_eq!(std::fs::read_link(&link).unwrap(), Path::new("en.json"));
        assert_eq!(std::fs::read_to_string(&link).unwrap(), "{}");
    }

    #[test]
    fn escaping_symlink_rejected() {
        let dir = temp_dir();
        let archive = dir.path().join("bundle.zip");
        bundle_with_link(&archive, "../../../etc/passwd");
        let dest = dir.path().join("out");

        let policy = ExtractionPolicy::default().allow_symlinks(true);
        let err = unzip(&archive, &dest, &policy).unwrap_err();
        assert!(matches!(err, Error::SymlinkEscape { .. }), "{err:?}");
    }

    #[test]
    fn chained_links_cannot_redirect_writes() {
        let dir = temp_dir();
        let archive = dir.path().join("bundle.zip");
        build_bundle(&archive, |zip| {
            zip.add_symlink("a", ".", SimpleFileOptions::default()).unwrap();
            zip.add_symlink("a/b", "..", SimpleFileOptions::default()).unwrap();
            add_file(zip, "a/b/evil.txt", b"pwned");
        });
        let dest = dir.path().join("out");

        let policy = ExtractionPolicy::default().allow_symlinks(true);
        let err = unzip(&archive, &dest, &policy).unwrap_err();

        assert!(matches!(err, Error::UnsafePath { .. }), "{err:?}");
        assert!(!dir.path().join("evil.txt").exists());
        assert!(!dest.join("evil.txt").exists());
        assert!(std::fs::symlink_metadata(dest.join("b")).is_err());
    }

    #[test]
    fn existing_link_in_destination_is_not_followed() {
        let dir = temp_dir();
        let outside = dir.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        let dest = dir.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("locale")).unwrap();

        let archive = dir.path().join("bundle.zip");
        build_bundle(&archive, |zip| add_file(zip, "locale/en.json", b"{}"));

        let err = unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap_err();

        assert!(matches!(err, Error::UnsafePath { .. }), "{err:?}");
        assert!(!outside.join("en.json").exists());
    }

    #[test]
    fn stored_permissions_applied() {
        let dir = temp_dir();
        let archive = dir.path().join("bundle.zip");
        build_bundle(&archive, |zip| {
            let options = SimpleFileOptions::default().unix_permissions(0o750);
            zip.start_file("run.sh", options).unwrap();
            zip.write_all(b"#!/bin/sh\n").unwrap();
        });
        let dest = dir.path().join("out");

        unzip(&archive, &dest, &ExtractionPolicy::default()).unwrap();

        let mode = std::fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
