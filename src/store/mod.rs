//! Storage layer: markdown content, media assets and the shared recycle
//! bin. Everything here is plain filesystem I/O; path containment is
//! enforced before any mutation.

use std::fs;
use std::path::Path;

use crate::{FolioError, Result};

pub mod content;
pub mod media;
pub mod recycle;

pub use content::{ContentStore, WriteOutcome};
pub use media::{MediaItem, MediaListing, MediaStore, MediaUpload};
pub use recycle::TrashedEntry;

/// Write bytes with an all-or-nothing outcome: temp file in the target
/// directory plus atomic rename, direct write only as a fallback. Either the
/// content lands intact at the target or the call fails cleanly; per-attempt
/// failures go to the log, never to the caller.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<&'static str> {
    let parent = path
        .parent()
        .ok_or_else(|| FolioError::WriteFailed("target has no parent directory".to_string()))?;

    let attempt = tempfile::NamedTempFile::new_in(parent)
        .and_then(|mut tmp| {
            use std::io::Write;
            tmp.write_all(content)?;
            tmp.flush()?;
            Ok(tmp)
        })
        .and_then(|tmp| tmp.persist(path).map_err(|e| e.error));

    match attempt {
        Ok(_) => Ok("atomic"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "atomic write failed, trying direct write");
            match fs::write(path, content) {
                Ok(()) => Ok("direct"),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "direct write failed");
                    Err(FolioError::WriteFailed(
                        "could not persist content".to_string(),
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_lands_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.md");

        let method = atomic_write(&path, b"hello").unwrap();
        assert_eq!(method, "atomic");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.md");
        fs::write(&path, "old").unwrap();

        atomic_write(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_atomic_write_missing_parent_fails_cleanly() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent").join("out.md");

        let result = atomic_write(&path, b"x");
        assert!(result.is_err());
        assert!(!path.exists());
    }
}
