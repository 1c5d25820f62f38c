//! Durable key-value storage for the authenticated session.
//!
//! Mirrors (does not own) the auth store's session so a restart can
//! re-hydrate it. Keys:
//!
//! - [`keys::USER`] - JSON-serialized user record
//! - [`keys::IS_AUTHENTICATED`] - presence means authenticated (value `"true"`)
//! - [`keys::COOKIES`] - the API's cookies, written by the HTTP gateway

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

/// Session cache keys.
pub mod keys {
    /// Key for the serialized current user.
    pub const USER: &str = "user";

    /// Key whose presence marks the session as authenticated.
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";

    /// Key holding the API's cookies as a JSON `name -> value` map.
    pub const COOKIES: &str = "cookies";
}

/// Errors raised by a session cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("session cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be encoded for, or decoded from, the cache.
    #[error("session cache is corrupt: {0}")]
    Corrupt(String),

    /// A previous writer panicked while holding the lock.
    #[error("session cache lock poisoned")]
    Poisoned,
}

/// Key-value storage that survives application restarts.
///
/// Reads and writes are synchronous. Callers never hold a value across an
/// await point, so no locking beyond the backend's own is required.
pub trait SessionCache: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

// =============================================================================
// MemoryCache
// =============================================================================

/// Process-lifetime cache. Used in tests and for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl SessionCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileCache
// =============================================================================

/// Cache persisted as a JSON object in a single file.
///
/// The file is loaded once on open and rewritten in full on every change,
/// through a temporary file renamed over the old one. A missing or
/// unreadable file is an empty cache. A failed write leaves both the file and
/// the in-memory entries unchanged.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileCache {
    /// Open (or lazily create) the cache at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read. A file that
    /// does not parse is treated as empty and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Session cache is corrupt; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "Session cache opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CacheError::Corrupt(e.to_string()))?;

        let staged = self.path.with_extension("json.tmp");
        fs::write(&staged, json)
            .and_then(|()| fs::rename(&staged, &self.path))
            .inspect_err(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to write session cache");
                let _ = fs::remove_file(&staged);
            })?;
        Ok(())
    }
}

impl SessionCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self.entries()?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries()?;
        if entries.contains_key(key) {
            let mut next = entries.clone();
            next.remove(key);
            self.persist(&next)?;
            *entries = next;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_set_get_remove() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get(keys::USER).unwrap(), None);

        cache.set(keys::USER, "{\"id\":1}").unwrap();
        assert_eq!(cache.get(keys::USER).unwrap().as_deref(), Some("{\"id\":1}"));

        cache.remove(keys::USER).unwrap();
        assert_eq!(cache.get(keys::USER).unwrap(), None);

        // Removing twice is fine.
        cache.remove(keys::USER).unwrap();
    }

    #[test]
    fn test_file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let cache = FileCache::open(&path).unwrap();
        cache.set(keys::IS_AUTHENTICATED, "true").unwrap();
        cache.set(keys::USER, "{\"id\":1}").unwrap();
        drop(cache);

        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::IS_AUTHENTICATED).unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(reopened.get(keys::USER).unwrap().as_deref(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_file_cache_remove_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let cache = FileCache::open(&path).unwrap();
        cache.set(keys::IS_AUTHENTICATED, "true").unwrap();
        cache.remove(keys::IS_AUTHENTICATED).unwrap();

        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(reopened.get(keys::IS_AUTHENTICATED).unwrap(), None);
    }

    #[test]
    fn test_file_cache_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(cache.get(keys::USER).unwrap(), None);
    }

    #[test]
    fn test_file_cache_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{\"user\": \"{\\\"id\\\":1").unwrap();

        let cache = FileCache::open(&path).unwrap();
        assert_eq!(cache.get(keys::USER).unwrap(), None);

        cache.set(keys::IS_AUTHENTICATED, "true").unwrap();
        let reopened = FileCache::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::IS_AUTHENTICATED).unwrap().as_deref(),
            Some("true")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_cache_failed_write_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let cache = FileCache::open(&path).unwrap();

        // A file where the parent directory should be makes every write fail.
        fs::write(dir.path().join("nested"), "").unwrap();

        assert!(cache.set(keys::IS_AUTHENTICATED, "true").is_err());
        assert_eq!(cache.get(keys::IS_AUTHENTICATED).unwrap(), None);
    }

    #[test]
    fn test_file_cache_failed_remove_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let cache = FileCache::open(&path).unwrap();
        cache.set(keys::USER, "{\"id\":1}").unwrap();

        // Replace the file with a directory so the rename cannot land.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(cache.remove(keys::USER).is_err());
        assert_eq!(cache.get(keys::USER).unwrap().as_deref(), Some("{\"id\":1}"));
    }
}
