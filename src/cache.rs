//! File-backed cache for Folio.
//!
//! One file per key under the cache directory, JSON payloads. Keys are
//! `<prefix>_<hash>` where the hash covers the operation parameters plus the
//! collection, so invalidation can target one exact key or everything under
//! a prefix. The cache knows nothing about source file mtimes; callers that
//! need staleness checks store the mtime inside the payload and compare
//! after retrieval.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::Result;

/// Build a cache key from a prefix and operation parameters.
///
/// Parameters are sorted before hashing so argument order never changes the
/// key.
pub fn cache_key(prefix: &str, params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort();
    let payload = serde_json::to_string(&sorted).unwrap_or_default();
    let digest = Sha256::digest(payload.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}_{}", &hex[..32])
}

/// File-backed key/value cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    enabled: bool,
}

impl FileCache {
    /// Create a cache over the given directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Result<Self> {
        let dir = dir.into();
        if enabled {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir, enabled })
    }

    /// A disabled cache: every `get` misses, every `set` is a no-op.
    pub fn disabled() -> Self {
        Self {
            dir: PathBuf::new(),
            enabled: false,
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.cache"))
    }

    /// Fetch a cached value. `max_age` of `None` means valid until
    /// explicitly invalidated. Unreadable or undecodable entries count as
    /// misses and are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Option<Duration>) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let path = self.entry_path(key);

        if let Some(max_age) = max_age {
            let age = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())?;
            if age > max_age {
                return None;
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "dropping undecodable cache entry");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Store a value under a key, overwriting any previous entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let content = serde_json::to_string(value)?;
        fs::write(self.entry_path(key), content)?;
        Ok(())
    }

    /// Remove one entry. Missing entries are fine.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every entry whose key starts with `prefix`. Returns the number
    /// removed.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        if !self.enabled {
            return 0;
        }
        let mut removed = 0;
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if name.starts_with(prefix)
                    && name.ends_with(".cache")
                    && fs::remove_file(entry.path()).is_ok()
                {
                    removed += 1;
                }
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileCache) {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::new(tmp.path().join("cache"), true).unwrap();
        (tmp, cache)
    }

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = cache_key("media", &[("path", "x"), ("collection", "blog")]);
        let b = cache_key("media", &[("collection", "blog"), ("path", "x")]);
        assert_eq!(a, b);
        assert!(a.starts_with("media_"));
    }

    #[test]
    fn test_cache_key_differs_by_params() {
        let a = cache_key("media", &[("path", "x")]);
        let b = cache_key("media", &[("path", "y")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_and_get() {
        let (_tmp, cache) = setup();
        cache.set("k1", &vec!["a".to_string(), "b".to_string()]).unwrap();

        let got: Option<Vec<String>> = cache.get("k1", None);
        assert_eq!(got, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_tmp, cache) = setup();
        let got: Option<String> = cache.get("absent", None);
        assert!(got.is_none());
    }

    #[test]
    fn test_max_age_expiry() {
        let (_tmp, cache) = setup();
        cache.set("k", &42u32).unwrap();

        let fresh: Option<u32> = cache.get("k", Some(Duration::from_secs(60)));
        assert_eq!(fresh, Some(42));

        std::thread::sleep(Duration::from_millis(30));
        let stale: Option<u32> = cache.get("k", Some(Duration::from_millis(1)));
        assert!(stale.is_none());
    }

    #[test]
    fn test_invalidate() {
        let (_tmp, cache) = setup();
        cache.set("k", &1u32).unwrap();
        cache.invalidate("k").unwrap();

        let got: Option<u32> = cache.get("k", None);
        assert!(got.is_none());

        // Invalidating a missing key is not an error
        cache.invalidate("k").unwrap();
    }

    #[test]
    fn test_invalidate_prefix() {
        let (_tmp, cache) = setup();
        cache.set("media_aaa", &1u32).unwrap();
        cache.set("media_bbb", &2u32).unwrap();
        cache.set("files_ccc", &3u32).unwrap();

        let removed = cache.invalidate_prefix("media_");
        assert_eq!(removed, 2);

        let kept: Option<u32> = cache.get("files_ccc", None);
        assert_eq!(kept, Some(3));
    }

    #[test]
    fn test_undecodable_entry_is_dropped() {
        let (tmp, cache) = setup();
        std::fs::write(tmp.path().join("cache").join("bad.cache"), "not json").unwrap();

        let got: Option<u32> = cache.get("bad", None);
        assert!(got.is_none());
        assert!(!tmp.path().join("cache").join("bad.cache").exists());
    }

    #[test]
    fn test_disabled_cache() {
        let cache = FileCache::disabled();
        cache.set("k", &1u32).unwrap();
        let got: Option<u32> = cache.get("k", None);
        assert!(got.is_none());
        assert_eq!(cache.invalidate_prefix("k"), 0);
    }
}
