//! Collection path resolution for Folio.
//!
//! A collection is a named content bucket laid out as:
//!
//! ```text
//! {content_root}/collections/{name}/
//! ├── files/              # active markdown documents
//! └── recycle/
//!     ├── files/          # soft-deleted documents
//!     └── images/         # soft-deleted media
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::safety::sanitize_write_filename;
use crate::Result;

/// Canonical directories of one resolved collection.
#[derive(Debug, Clone)]
pub struct CollectionPaths {
    /// Collection name. Empty in degraded mode (no collections exist).
    pub name: String,
    /// The collection's root directory.
    pub root: PathBuf,
    /// Active markdown documents.
    pub files_dir: PathBuf,
    /// Soft-deleted documents.
    pub recycle_files_dir: PathBuf,
    /// Soft-deleted media.
    pub recycle_images_dir: PathBuf,
}

/// Resolves collection names to their directory layout.
#[derive(Debug, Clone)]
pub struct PathResolver {
    content_root: PathBuf,
}

impl PathResolver {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    /// The configured content root.
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// List collection names by directory scan, sorted.
    pub fn collections(&self) -> Vec<String> {
        let collections_dir = self.content_root.join("collections");
        let mut names = Vec::new();
        if let Ok(entries) = fs::read_dir(&collections_dir) {
            for entry in entries.flatten() {
                if entry.path().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names.sort();
        names
    }

    /// Resolve a collection name to its directory layout.
    ///
    /// An unknown or empty name falls back to the first collection found; if
    /// none exist the content root itself is used with `recycle/` beside it.
    /// Both fallbacks are decisions, not errors. The resolved collection's
    /// subdirectories are created lazily here.
    pub fn resolve(&self, name: &str) -> Result<CollectionPaths> {
        let collections_dir = self.content_root.join("collections");
        let requested = sanitize_write_filename(name);

        let (name, root) = if !requested.is_empty() && collections_dir.join(&requested).is_dir() {
            (requested.clone(), collections_dir.join(&requested))
        } else if let Some(first) = self.collections().into_iter().next() {
            if !requested.is_empty() {
                tracing::debug!(requested = %requested, fallback = %first, "unknown collection, using first available");
            }
            let root = collections_dir.join(&first);
            (first, root)
        } else {
            tracing::warn!(
                root = %self.content_root.display(),
                "no collections found; degrading to the content root"
            );
            (String::new(), self.content_root.clone())
        };

        let paths = if name.is_empty() {
            CollectionPaths {
                name,
                files_dir: root.clone(),
                recycle_files_dir: root.join("recycle").join("files"),
                recycle_images_dir: root.join("recycle").join("images"),
                root,
            }
        } else {
            CollectionPaths {
                name,
                files_dir: root.join("files"),
                recycle_files_dir: root.join("recycle").join("files"),
                recycle_images_dir: root.join("recycle").join("images"),
                root,
            }
        };

        fs::create_dir_all(&paths.files_dir)?;
        fs::create_dir_all(&paths.recycle_files_dir)?;
        fs::create_dir_all(&paths.recycle_images_dir)?;

        Ok(paths)
    }
}
