//! Media asset store.
//!
//! Images live under a shared media root, optionally nested in
//! subdirectories, and are served from a public URL prefix. Soft-deleted
//! images move under the owning collection's `recycle/images/<subpath>/`,
//! mirroring the content store's transitions.
//!
//! Upload collisions get `_<n>` incrementing suffixes while trash collisions
//! get timestamps. The policies are intentionally different: uploads collide
//! often with generic camera names, trash entries rarely.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::recycle::{self, TrashedEntry};
use crate::cache::{cache_key, FileCache};
use crate::safety::{ensure_within, sanitize_media_name, sanitize_rel_path};
use crate::{FolioError, Result};

const LIST_PREFIX: &str = "media_listing";

/// One entry of a media directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// `"dir"` or `"image"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Path relative to the media root, including the name.
    pub path: String,
    /// Public URL, images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Byte size, images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// One level of the media tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaListing {
    pub path: String,
    pub items: Vec<MediaItem>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct MediaUpload {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Media asset operations for one request's collection.
#[derive(Debug, Clone)]
pub struct MediaStore {
    media_root: PathBuf,
    recycle_dir: PathBuf,
    public_url: String,
    collection: String,
    cache: FileCache,
    list_ttl: Duration,
    max_bytes: u64,
    extensions: Vec<String>,
}

impl MediaStore {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        media_root: impl Into<PathBuf>,
        recycle_dir: impl Into<PathBuf>,
        public_url: impl Into<String>,
        collection: impl Into<String>,
        cache: FileCache,
        list_ttl: Duration,
        max_bytes: u64,
        extensions: Vec<String>,
    ) -> Result<Self> {
        let media_root = media_root.into();
        fs::create_dir_all(&media_root)?;
        Ok(Self {
            media_root,
            recycle_dir: recycle_dir.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            cache,
            list_ttl,
            max_bytes,
            extensions,
        })
    }

    fn extension_allowed(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    fn public_url_for(&self, rel: &str, name: &str) -> String {
        let mut url = self.public_url.clone();
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url.push('/');
        url.push_str(&urlencoding::encode(name));
        url
    }

    fn join_rel(rel: &str, name: &str) -> String {
        if rel.is_empty() {
            name.to_string()
        } else {
            format!("{rel}/{name}")
        }
    }

    /// Resolve a subdirectory inside the media root.
    fn media_dir(&self, rel: &str) -> Result<PathBuf> {
        ensure_within(&self.media_root, &self.media_root.join(rel))
    }

    /// List one level of a media subdirectory: directories first, then
    /// images, both case-insensitive alphabetical. Cached briefly; uploads
    /// are frequent and user-visible.
    pub fn list(&self, path: &str) -> Result<MediaListing> {
        let rel = sanitize_rel_path(path);
        let key = cache_key(
            LIST_PREFIX,
            &[("path", &rel), ("collection", &self.collection)],
        );
        if let Some(cached) = self.cache.get::<MediaListing>(&key, Some(self.list_ttl)) {
            return Ok(cached);
        }

        let dir = self.media_dir(&rel)?;
        let mut dirs: Vec<MediaItem> = Vec::new();
        let mut images: Vec<MediaItem> = Vec::new();

        if let Ok(entries) = fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let item_path = Self::join_rel(&rel, &name);
                if entry.path().is_dir() {
                    dirs.push(MediaItem {
                        kind: "dir".to_string(),
                        name,
                        path: item_path,
                        url: None,
                        size: None,
                    });
                } else if self.extension_allowed(&name) {
                    let size = entry.metadata().map(|m| m.len()).ok();
                    images.push(MediaItem {
                        kind: "image".to_string(),
                        url: Some(self.public_url_for(&rel, &name)),
                        name,
                        path: item_path,
                        size,
                    });
                }
            }
        }

        dirs.sort_by_key(|item| item.name.to_lowercase());
        images.sort_by_key(|item| item.name.to_lowercase());
        dirs.extend(images);

        let listing = MediaListing {
            path: rel,
            items: dirs,
        };
        let _ = self.cache.set(&key, &listing);
        Ok(listing)
    }

    /// Pick an upload destination name that does not collide, with the
    /// `_<n>` incrementing suffix policy.
    fn free_upload_name(dir: &Path, name: &str) -> String {
        if !dir.join(name).exists() {
            return name.to_string();
        }
        let (stem, ext) = match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
            _ => (name, ""),
        };
        let mut n = 1;
        loop {
            let candidate = format!("{stem}_{n}{ext}");
            if !dir.join(&candidate).exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Store an uploaded image.
    ///
    /// Rejects unsupported extensions and non-image content types with a
    /// descriptive reason; oversize payloads are rejected before touching
    /// the disk.
    pub fn upload(
        &self,
        original_name: &str,
        bytes: &[u8],
        path: &str,
        content_type: Option<&str>,
    ) -> Result<MediaUpload> {
        if bytes.is_empty() {
            return Err(FolioError::UploadRejected("empty upload".to_string()));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(FolioError::UploadRejected(format!(
                "file exceeds the maximum upload size ({} MB)",
                self.max_bytes / 1024 / 1024
            )));
        }

        let name = sanitize_media_name(original_name);
        if !self.extension_allowed(&name) {
            return Err(FolioError::UploadRejected(
                "unsupported file extension".to_string(),
            ));
        }
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&name).first_or_octet_stream().to_string());
        if !content_type.starts_with("image/") {
            return Err(FolioError::UploadRejected(format!(
                "unsupported content type {content_type}"
            )));
        }

        let rel = sanitize_rel_path(path);
        let dir = self.media_dir(&rel)?;
        fs::create_dir_all(&dir)?;

        let final_name = Self::free_upload_name(&dir, &name);
        let dest = ensure_within(&self.media_root, &dir.join(&final_name))?;
        super::atomic_write(&dest, bytes)?;

        self.cache.invalidate_prefix(LIST_PREFIX);
        Ok(MediaUpload {
            url: self.public_url_for(&rel, &final_name),
            filename: final_name,
            size: bytes.len() as u64,
        })
    }

    /// Create a subdirectory. Fails with `Conflict` when it already exists.
    pub fn create_dir(&self, name: &str, path: &str) -> Result<String> {
        let name = sanitize_media_name(name);
        if name.is_empty() {
            return Err(FolioError::InvalidRequest("empty directory name".to_string()));
        }
        let rel = sanitize_rel_path(path);
        let parent = self.media_dir(&rel)?;
        let dir = ensure_within(&self.media_root, &parent.join(&name))?;
        if dir.exists() {
            return Err(FolioError::Conflict(format!(
                "directory {name} already exists"
            )));
        }
        fs::create_dir_all(&dir)?;
        self.cache.invalidate_prefix(LIST_PREFIX);
        Ok(Self::join_rel(&rel, &name))
    }

    /// Recursively delete a subdirectory and its contents.
    pub fn delete_dir(&self, name: &str, path: &str) -> Result<()> {
        let name = sanitize_media_name(name);
        let rel = sanitize_rel_path(path);
        let dir = ensure_within(&self.media_root, &self.media_root.join(&rel).join(&name))?;
        if dir == self.media_root {
            return Err(FolioError::InvalidRequest(
                "refusing to delete the media root".to_string(),
            ));
        }
        if !dir.is_dir() {
            return Err(FolioError::NotFound(format!("directory {name}")));
        }
        fs::remove_dir_all(&dir)?;
        self.cache.invalidate_prefix(LIST_PREFIX);
        Ok(())
    }

    /// Trash directory for a given subpath.
    fn trash_dir(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.recycle_dir.clone()
        } else {
            self.recycle_dir.join(rel)
        }
    }

    /// Move an image to the recycle bin. Returns the trashed name.
    pub fn soft_delete(&self, name: &str, path: &str) -> Result<String> {
        let name = sanitize_media_name(name);
        let rel = sanitize_rel_path(path);
        let src = ensure_within(&self.media_root, &self.media_root.join(&rel).join(&name))?;
        if !src.is_file() {
            return Err(FolioError::NotFound(format!("image {name}")));
        }

        let trashed = recycle::move_to_trash(&src, &self.trash_dir(&rel))?;
        self.cache.invalidate_prefix(LIST_PREFIX);
        Ok(trashed)
    }

    /// Restore a trashed image to its original subpath.
    pub fn restore(&self, name: &str, path: &str) -> Result<String> {
        let name = sanitize_media_name(name);
        let rel = sanitize_rel_path(path);
        let src = ensure_within(&self.recycle_dir, &self.trash_dir(&rel).join(&name))?;
        if !src.is_file() {
            return Err(FolioError::NotFound(format!("trashed image {name}")));
        }

        let dest_dir = self.media_root.join(&rel);
        let restored = recycle::restore_from_trash(&src, &dest_dir)?;
        self.cache.invalidate_prefix(LIST_PREFIX);
        Ok(restored)
    }

    /// Permanently delete an image from the recycle bin only.
    pub fn purge(&self, name: &str, path: &str) -> Result<()> {
        let name = sanitize_media_name(name);
        let rel = sanitize_rel_path(path);
        let target = ensure_within(&self.recycle_dir, &self.trash_dir(&rel).join(&name))?;
        if !target.is_file() {
            return Err(FolioError::NotFound(format!("trashed image {name}")));
        }
        fs::remove_file(&target)?;
        Ok(())
    }

    /// List soft-deleted images, newest first.
    pub fn list_trashed(&self) -> Vec<TrashedEntry> {
        let extensions = self.extensions.clone();
        recycle::list_trashed(&self.recycle_dir, &move |name| {
            Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| extensions.iter().any(|a| *a == ext.to_lowercase()))
                .unwrap_or(false)
        })
    }

    /// Empty this collection's image recycle bin.
    pub fn empty_recycle_bin(&self) -> Result<()> {
        recycle::empty_dir_contents(&self.recycle_dir)
    }
}
