//! Shared recycle-bin primitives.
//!
//! Both stores soft-delete by moving files into a recycle directory. Trash
//! collisions get a `_<YmdHis>` timestamp suffix before the extension;
//! restore strips that suffix to recover the original name and falls back to
//! a `_restored_<YmdHis>` suffix when the active name is taken. Nothing in a
//! recycle directory is ever overwritten.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::{FolioError, Result};

/// One soft-deleted file.
#[derive(Debug, Clone, Serialize)]
pub struct TrashedEntry {
    /// Name inside the recycle directory (may carry a timestamp suffix).
    pub name: String,
    /// Name the file had before deletion.
    pub original_name: String,
    /// When the file was trashed.
    pub deleted_at: DateTime<Utc>,
    /// File size in bytes.
    pub size: u64,
    /// Subdirectory chain relative to the recycle root, empty at top level.
    pub rel_path: String,
}

/// Current local time as a `YmdHis` suffix.
fn timestamp() -> String {
    Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Split a filename into stem and extension (extension includes the dot).
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Insert a suffix before the extension: `post.md` + `x` = `post_x.md`.
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let (stem, ext) = split_name(name);
    format!("{stem}_{suffix}{ext}")
}

/// Recover the original name by stripping a trailing `_<14-digit-timestamp>`
/// suffix, if present.
pub fn strip_timestamp_suffix(name: &str) -> String {
    let (stem, ext) = split_name(name);
    if stem.len() > 15 {
        let (head, tail) = stem.split_at(stem.len() - 15);
        if tail.starts_with('_') && tail[1..].chars().all(|c| c.is_ascii_digit()) {
            return format!("{head}{ext}");
        }
    }
    name.to_string()
}

/// Pick a destination name in `dir` that does not collide, using the
/// timestamp suffix policy.
fn free_trash_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    let ts = timestamp();
    let candidate = with_suffix(name, &ts);
    if !dir.join(&candidate).exists() {
        return candidate;
    }
    // Same name trashed twice within one second
    let mut n = 1;
    loop {
        let candidate = with_suffix(name, &format!("{ts}{n:02}"));
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Move a file into a trash directory, never overwriting. Returns the name
/// it was stored under.
pub fn move_to_trash(src: &Path, trash_dir: &Path) -> Result<String> {
    let name = src
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FolioError::InvalidRequest("bad filename".to_string()))?;

    fs::create_dir_all(trash_dir)?;
    let dest_name = free_trash_name(trash_dir, name);
    fs::rename(src, trash_dir.join(&dest_name))?;
    Ok(dest_name)
}

/// Move a trashed file back into `dest_dir`, recovering the original name.
/// An active-name collision gets a `_restored_<YmdHis>` suffix instead of
/// overwriting. Returns the restored name.
pub fn restore_from_trash(src: &Path, dest_dir: &Path) -> Result<String> {
    let name = src
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FolioError::InvalidRequest("bad filename".to_string()))?;
    if !src.is_file() {
        return Err(FolioError::NotFound(format!("trashed file {name}")));
    }

    fs::create_dir_all(dest_dir)?;
    let original = strip_timestamp_suffix(name);
    let dest_name = if dest_dir.join(&original).exists() {
        with_suffix(&original, &format!("restored_{}", timestamp()))
    } else {
        original
    };

    fs::rename(src, dest_dir.join(&dest_name))?;
    Ok(dest_name)
}

fn walk(root: &Path, dir: &Path, filter: &dyn Fn(&str) -> bool, out: &mut Vec<TrashedEntry>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, filter, out);
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !filter(name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let deleted_at: DateTime<Utc> = meta
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());
        let rel_path = path
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        out.push(TrashedEntry {
            name: name.to_string(),
            original_name: strip_timestamp_suffix(name),
            deleted_at,
            size: meta.len(),
            rel_path,
        });
    }
}

/// Recursively list trashed files under `root` passing the name filter,
/// newest first.
pub fn list_trashed(root: &Path, filter: &dyn Fn(&str) -> bool) -> Vec<TrashedEntry> {
    let mut entries = Vec::new();
    walk(root, root, filter, &mut entries);
    entries.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at));
    entries
}

/// Recursively delete a directory's contents, keeping the directory itself.
pub fn empty_dir_contents(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
