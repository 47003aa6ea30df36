//! Markdown content store.
//!
//! CRUD over one collection's `files/*.md`, with a read-through cache and
//! the recycle-bin lifecycle: absent → active → trashed → (restored →
//! active | purged → absent). Edits are whole-content overwrites; there is
//! no partial patch.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::recycle::{self, TrashedEntry};
use crate::cache::{cache_key, FileCache};
use crate::frontmatter::{self, FieldSchema};
use crate::paths::CollectionPaths;
use crate::safety::{ensure_within, sanitize_filename, sanitize_write_filename};
use crate::{FolioError, Result};

const LIST_PREFIX: &str = "markdown_files";
const READ_PREFIX: &str = "file_content";

/// Cached file content, carrying the source mtime it was read at.
#[derive(Debug, Serialize, Deserialize)]
struct CachedContent {
    content: String,
    last_modified: u64,
}

/// Outcome of a successful write.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// The (sanitized) filename written.
    pub filename: String,
    /// Strategy that landed the content (`atomic` or `direct`).
    pub method: &'static str,
}

fn epoch_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Whether two paths name the same underlying file.
///
/// On a case-insensitive filesystem a case-variant of an existing file
/// resolves to it; on a case-sensitive one it can be a distinct file.
fn is_same_file(a: &std::path::Path, b: &std::path::Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let (Ok(ma), Ok(mb)) = (fs::metadata(a), fs::metadata(b)) {
            return ma.dev() == mb.dev() && ma.ino() == mb.ino();
        }
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Markdown CRUD for one resolved collection.
#[derive(Debug, Clone)]
pub struct ContentStore {
    paths: CollectionPaths,
    cache: FileCache,
    max_bytes: u64,
}

impl ContentStore {
    pub fn new(paths: CollectionPaths, cache: FileCache, max_bytes: u64) -> Self {
        Self {
            paths,
            cache,
            max_bytes,
        }
    }

    /// The collection this store operates on.
    pub fn collection(&self) -> &str {
        &self.paths.name
    }

    fn list_key(&self) -> String {
        cache_key(LIST_PREFIX, &[("collection", &self.paths.name)])
    }

    fn read_key(&self, filename: &str) -> String {
        cache_key(
            READ_PREFIX,
            &[("file", filename), ("collection", &self.paths.name)],
        )
    }

    fn invalidate_after_mutation(&self, filename: &str) {
        let _ = self.cache.invalidate(&self.read_key(filename));
        let _ = self.cache.invalidate(&self.list_key());
    }

    /// Resolve and contain a filename inside the active files directory.
    fn active_path(&self, filename: &str) -> Result<PathBuf> {
        ensure_within(&self.paths.files_dir, &self.paths.files_dir.join(filename))
    }

    /// Resolve and contain a filename inside the recycle directory.
    fn trash_path(&self, filename: &str) -> Result<PathBuf> {
        ensure_within(
            &self.paths.recycle_files_dir,
            &self.paths.recycle_files_dir.join(filename),
        )
    }

    fn require_md(name: &str) -> Result<()> {
        if name.is_empty() || !name.to_lowercase().ends_with(".md") {
            return Err(FolioError::InvalidRequest(
                "filename must end in .md".to_string(),
            ));
        }
        Ok(())
    }

    /// List `*.md` files, most recently created first. A missing or empty
    /// directory is an empty list, not an error.
    pub fn list(&self) -> Result<Vec<String>> {
        if let Some(cached) = self.cache.get::<Vec<String>>(&self.list_key(), None) {
            return Ok(cached);
        }

        let mut files: Vec<(String, u64)> = Vec::new();
        if let Ok(entries) = fs::read_dir(&self.paths.files_dir) {
            for entry in entries.flatten() {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                if !name.to_lowercase().ends_with(".md") || !entry.path().is_file() {
                    continue;
                }
                let Ok(meta) = entry.metadata() else { continue };
                let created = meta
                    .created()
                    .or_else(|_| meta.modified())
                    .map(epoch_secs)
                    .unwrap_or(0);
                files.push((name, created));
            }
        }
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let names: Vec<String> = files.into_iter().map(|(name, _)| name).collect();
        let _ = self.cache.set(&self.list_key(), &names);
        Ok(names)
    }

    /// Read one file's raw content, through the cache.
    ///
    /// A cache hit is valid only while its stored mtime is at least the
    /// file's current mtime.
    pub fn read(&self, filename: &str) -> Result<String> {
        let name = sanitize_filename(filename);
        Self::require_md(&name)?;
        let path = self.active_path(&name)?;

        if !path.is_file() {
            return Err(FolioError::NotFound(format!("file {name}")));
        }
        let mtime = epoch_secs(fs::metadata(&path)?.modified()?);

        let key = self.read_key(&name);
        if let Some(cached) = self.cache.get::<CachedContent>(&key, None) {
            if cached.last_modified >= mtime {
                return Ok(cached.content);
            }
        }

        let content = fs::read_to_string(&path)?;
        let _ = self.cache.set(
            &key,
            &CachedContent {
                content: content.clone(),
                last_modified: mtime,
            },
        );
        Ok(content)
    }

    /// The file's current mtime in epoch seconds, for optimistic checks.
    pub fn modified_at(&self, filename: &str) -> Result<u64> {
        let name = sanitize_filename(filename);
        let path = self.active_path(&name)?;
        if !path.is_file() {
            return Err(FolioError::NotFound(format!("file {name}")));
        }
        Ok(epoch_secs(fs::metadata(&path)?.modified()?))
    }

    /// Overwrite a file's full content.
    ///
    /// Front matter is synthesized when absent and a `tags` key guaranteed.
    /// `if_unmodified_since` makes the write optimistic: it fails with
    /// `Conflict` when the file changed after that time.
    pub fn write(
        &self,
        filename: &str,
        content: &str,
        if_unmodified_since: Option<u64>,
    ) -> Result<WriteOutcome> {
        let name = sanitize_write_filename(filename);
        Self::require_md(&name)?;

        if content.len() as u64 > self.max_bytes {
            return Err(FolioError::PayloadTooLarge(self.max_bytes));
        }

        let path = self.active_path(&name)?;

        if let Some(expected) = if_unmodified_since {
            if path.is_file() {
                let current = epoch_secs(fs::metadata(&path)?.modified()?);
                if current > expected {
                    return Err(FolioError::Conflict(
                        "file was modified by someone else".to_string(),
                    ));
                }
            }
        }

        let content = frontmatter::ensure_front_matter(content);
        let method = super::atomic_write(&path, content.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o644));
        }

        self.invalidate_after_mutation(&name);
        Ok(WriteOutcome {
            filename: name,
            method,
        })
    }

    /// Merge submitted field values into the file's front matter, then write
    /// the result.
    pub fn save_with_fields(
        &self,
        filename: &str,
        content: &str,
        field_values: &HashMap<String, String>,
        schema: &FieldSchema,
        if_unmodified_since: Option<u64>,
    ) -> Result<WriteOutcome> {
        let merged = frontmatter::update(content, field_values, schema);
        self.write(filename, &merged, if_unmodified_since)
    }

    /// Create a new file. Fails with `Conflict` when it already exists.
    pub fn create(&self, filename: &str, content: &str) -> Result<WriteOutcome> {
        let name = sanitize_write_filename(filename);
        Self::require_md(&name)?;
        let path = self.active_path(&name)?;
        if path.exists() {
            return Err(FolioError::Conflict(format!("file {name} already exists")));
        }
        self.write(&name, content, None)
    }

    /// Rename a file. The target must not exist, except for a case-only
    /// rename of the same file. A target appearing concurrently is an
    /// accepted `Conflict` outcome, not something to prevent with delays.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(String, String)> {
        let old = sanitize_write_filename(old_name);
        let new = sanitize_write_filename(new_name);
        Self::require_md(&old)?;
        Self::require_md(&new)?;

        let old_path = self.active_path(&old)?;
        if !old_path.is_file() {
            return Err(FolioError::NotFound(format!("file {old}")));
        }
        let new_path = self.active_path(&new)?;

        // A case-only rename is allowed to "collide" with itself on a
        // case-insensitive filesystem. On a case-sensitive one the variant
        // can be a distinct file, which must stay a conflict.
        let case_only = old.to_lowercase() == new.to_lowercase() && old != new;
        if new_path.exists() && !(case_only && is_same_file(&old_path, &new_path)) {
            return Err(FolioError::Conflict(format!("file {new} already exists")));
        }

        fs::rename(&old_path, &new_path)?;
        self.invalidate_after_mutation(&old);
        let _ = self.cache.invalidate(&self.read_key(&new));
        Ok((old, new))
    }

    /// Move a file to the recycle bin. Returns the name it was trashed
    /// under.
    pub fn soft_delete(&self, filename: &str) -> Result<String> {
        let name = sanitize_write_filename(filename);
        Self::require_md(&name)?;
        let path = self.active_path(&name)?;
        if !path.is_file() {
            return Err(FolioError::NotFound(format!("file {name}")));
        }

        let trashed = recycle::move_to_trash(&path, &self.paths.recycle_files_dir)?;
        self.invalidate_after_mutation(&name);
        Ok(trashed)
    }

    /// Restore a trashed file. Returns the name it came back under.
    pub fn restore(&self, filename: &str) -> Result<String> {
        let name = sanitize_write_filename(filename);
        let src = self.trash_path(&name)?;
        if !src.is_file() {
            return Err(FolioError::NotFound(format!("trashed file {name}")));
        }

        let restored = recycle::restore_from_trash(&src, &self.paths.files_dir)?;
        let _ = self.cache.invalidate(&self.list_key());
        let _ = self.cache.invalidate(&self.read_key(&restored));
        Ok(restored)
    }

    /// Permanently delete from the recycle bin only.
    pub fn purge(&self, filename: &str) -> Result<()> {
        let name = sanitize_write_filename(filename);
        let path = self.trash_path(&name)?;
        if !path.is_file() {
            return Err(FolioError::NotFound(format!("trashed file {name}")));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    /// List soft-deleted markdown files, newest first.
    pub fn list_trashed(&self) -> Vec<TrashedEntry> {
        recycle::list_trashed(&self.paths.recycle_files_dir, &|name| {
            name.to_lowercase().ends_with(".md")
        })
    }

    /// Empty this collection's file recycle bin.
    pub fn empty_recycle_bin(&self) -> Result<()> {
        recycle::empty_dir_contents(&self.paths.recycle_files_dir)
    }
}
