//! Session-scoped key/value storage
//!
//! The navigation controller persists the last successful `{query, page}` here so
//! that a restart within the same session resumes where the user left off.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Key holding the last query
pub const SESSION_QUERY_KEY: &str = "gh.q";

/// Key holding the last page
pub const SESSION_PAGE_KEY: &str = "gh.page";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String entries scoped to one session
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Session store that lives as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`
    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Session store persisted as a JSON object in one file
///
/// The whole file is rewritten on every `set`. A missing file starts an empty
/// session; an unreadable or corrupt one is logged and replaced on the next write.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Opens (or prepares to create) the session file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(entries) => {
                    tracing::debug!(
                        "Loaded {} session entries from {}",
                        entries.len(),
                        path.display()
                    );
                    entries
                }
                Err(e) => {
                    tracing::warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read session file {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Default location: `<cache dir>/gitscout/session.json`
    ///
    /// Falls back to the system temp directory when the platform has no cache dir.
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("gitscout")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::with_entries([(SESSION_QUERY_KEY, "tokio")]);
        assert_eq!(store.get(SESSION_QUERY_KEY).as_deref(), Some("tokio"));
        assert_eq!(store.get(SESSION_PAGE_KEY), None);

        store.set(SESSION_PAGE_KEY, "3").unwrap();
        assert_eq!(store.get(SESSION_PAGE_KEY).as_deref(), Some("3"));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::open(&path);
        assert_eq!(store.get(SESSION_QUERY_KEY), None);
        store.set(SESSION_QUERY_KEY, "language:rust").unwrap();
        store.set(SESSION_PAGE_KEY, "2").unwrap();

        let reopened = FileSessionStore::open(&path);
        assert_eq!(reopened.get(SESSION_QUERY_KEY).as_deref(), Some("language:rust"));
        assert_eq!(reopened.get(SESSION_PAGE_KEY).as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::open(&path);
        assert_eq!(store.get(SESSION_QUERY_KEY), None);

        store.set(SESSION_QUERY_KEY, "serde").unwrap();
        assert_eq!(
            FileSessionStore::open(&path).get(SESSION_QUERY_KEY).as_deref(),
            Some("serde")
        );
    }
}
