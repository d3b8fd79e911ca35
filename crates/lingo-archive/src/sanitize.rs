use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SanitizedPath {
    pub original: String,
    /// Entry name after normalization, relative to the destination.
    pub relative: PathBuf,
    /// Absolute target path, guaranteed to be a descendant of the destination.
    pub resolved: PathBuf,
}

/// Normalize a stored entry name.
///
/// Segments are split on `/`, `.` and empty segments are dropped and `..`
/// consumes the previous segment. A leading slash anchors the name, so `..`
/// cannot climb above it, and is then removed. A relative name keeps any `..`
/// it cannot resolve; [`sanitize_entry_path`] rejects those.
pub fn normalize_entry_name(name: &str) -> String {
    let rooted = name.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            part => parts.push(part),
        }
    }

    parts.join("/")
}

/// Resolve an entry name under `root`.
///
/// `root` must already be absolute and normalized. Returns `Ok(None)` for
/// names that normalize to the root itself (e.g. `./`), which carry nothing
/// to extract.
pub fn sanitize_entry_path(name: &str, root: &Path) -> Result<Option<SanitizedPath>> {
    if name.contains('\0') {
        return Err(Error::InvalidPath);
    }

    let relative = normalize_entry_name(name);
    if relative.is_empty() {
        return Ok(None);
    }

    let resolved = normalize_path(&root.join(&relative));
    if resolved == root || !resolved.starts_with(root) {
        return Err(Error::UnsafePath {
            entry: name.to_owned(),
            resolved,
        });
    }

    Ok(Some(SanitizedPath {
        original: name.to_owned(),
        relative: PathBuf::from(relative),
        resolved,
    }))
}

/// Reject `entry` when any existing path between `root` and the entry
/// itself is a symlink.
///
/// [`sanitize_entry_path`] only looks at the name. This looks at the disk,
/// where links laid down by earlier entries can point anywhere.
pub fn ensure_no_linked_ancestor(entry: &SanitizedPath, root: &Path) -> Result<()> {
    let mut current = root.to_path_buf();
    for component in entry.relative.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::UnsafePath {
                    entry: entry.original.clone(),
                    resolved: current,
                });
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Resolve a symlink target relative to the link's location.
///
/// Absolute targets are rejected outright and relative ones must stay
/// inside `base`.
pub fn sanitize_symlink_target(target: &Path, symlink_location: &Path, base: &Path) -> Result<PathBuf> {
    if target.is_absolute() || target.has_root() {
        return Err(Error::AbsoluteSymlinkTarget {
            target: target.to_path_buf(),
            symlink: symlink_location.to_path_buf(),
        });
    }

    let resolved = symlink_location
        .parent()
        .map(|p| p.join(target))
        .unwrap_or_else(|| base.join(target));
    let final_path = normalize_path(&resolved);

    if !final_path.starts_with(base) {
        return Err(Error::SymlinkEscape {
            target: target.to_path_buf(),
            resolved: final_path,
        });
    }

    Ok(final_path)
}

/// Lexically resolve `.` and `..` components.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
