//! Local ephemeral cache used to stage in-progress guesses before they are
//! flushed to the progress store.

use crossword_core::model::{CrosswordId, ProfileId};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(String),

    #[error("cache serialization error: {0}")]
    Serialization(String),

    #[error("cache lock poisoned")]
    Poisoned,
}

/// Cache key of one play session.
#[must_use]
pub fn progress_storage_key(crossword_id: CrosswordId, profile_id: ProfileId) -> String {
    format!("crossword-{crossword_id}-{profile_id}")
}

/// Synchronous string key-value store scoped to one device.
pub trait LocalCache: Send + Sync {
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// # Errors
    ///
    /// Returns `CacheError` if the value cannot be stored.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the backing store cannot be updated.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, CacheError> {
    mutex.lock().map_err(|_| CacheError::Poisoned)
}

/// Process-local cache; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// Cache persisted as a single JSON object on disk, so staged guesses survive
/// a restart of the process.
///
/// Every mutation rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileCache {
    /// Open the cache at `path`. A missing file starts empty; an unreadable
    /// JSON body is logged and discarded.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str(&body).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CacheError::Io(e.to_string())),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io(e.to_string()))?;
        }
        let body =
            serde_json::to_string_pretty(entries).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, body).map_err(|e| CacheError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CacheError::Io(e.to_string()))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut guard = lock(&self.entries)?;
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut guard = lock(&self.entries)?;
        if guard.remove(key).is_some() {
            self.persist(&guard)?;
        }
        Ok(())
    }
}
