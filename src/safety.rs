//! Path safety for Folio.
//!
//! Every read/write/delete operation runs its resolved path through
//! [`ensure_within`] before touching the filesystem. Filename sanitizing is
//! defense in depth on top of that check, not a substitute for it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::{FolioError, Result};

/// Strip `../` and `..\` sequences until none remain.
///
/// Repeated because a single pass can reassemble a new sequence
/// (e.g. `"..././../"`).
fn strip_traversal(name: &str) -> String {
    let mut s = name.to_string();
    loop {
        let next = s.replace("../", "").replace("..\\", "");
        if next == s {
            break;
        }
        s = next;
    }
    s
}

/// Sanitize a content filename for read-side operations.
pub fn sanitize_filename(raw: &str) -> String {
    strip_traversal(raw.trim())
}

/// Sanitize a content filename for write-side operations.
///
/// Writes never target subdirectories, so all path separators go too.
pub fn sanitize_write_filename(raw: &str) -> String {
    strip_traversal(raw.trim())
        .replace(['/', '\\'], "")
}

/// Sanitize an uploaded media filename: lower-case, spaces to underscores,
/// anything outside `[a-z0-9_.-]` dropped.
pub fn sanitize_media_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

/// Sanitize a media subdirectory chain. Empty, `.` and `..` segments are
/// dropped; the result uses `/` separators regardless of input.
pub fn sanitize_rel_path(raw: &str) -> String {
    raw.split(['/', '\\'])
        .map(str::trim)
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve `candidate` and verify it stays inside `root`.
///
/// Symlinks and `..` in the existing part of the path are resolved via
/// canonicalization; components past the last existing ancestor are appended
/// lexically, with any remaining parent component refused. Returns the
/// resolved absolute path on success.
pub fn ensure_within(root: &Path, candidate: &Path) -> Result<PathBuf> {
    let canonical_root = fs::canonicalize(root)?;

    // Split the candidate into its longest existing ancestor and the rest.
    let mut existing = candidate.to_path_buf();
    let mut remainder: Vec<std::ffi::OsString> = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => {
                tracing::warn!(requested = %candidate.display(), "path has no existing ancestor");
                return Err(FolioError::SecurityViolation);
            }
        }
    }

    let mut resolved = fs::canonicalize(&existing)?;
    for name in remainder.iter().rev() {
        match Path::new(name).components().next() {
            Some(Component::Normal(_)) => resolved.push(name),
            _ => {
                tracing::warn!(requested = %candidate.display(), "refusing non-normal path component");
                return Err(FolioError::SecurityViolation);
            }
        }
    }

    if resolved.starts_with(&canonical_root) {
        Ok(resolved)
    } else {
        tracing::warn!(requested = %candidate.display(), "path escapes its root");
        Err(FolioError::SecurityViolation)
    }
}
