use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};

/// Key the todo collection is stored under. Changing it is the only
/// migration mechanism: old blobs are simply no longer read.
pub const STORAGE_KEY: &str = "todos.v1";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stored todos are not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("could not serialize todos: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Local key-value storage holding whole JSON blobs.
pub trait KeyValueStore {
    /// Fetch the blob for `key`; `Ok(None)` when nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob for `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Keep a copy of a blob that could not be loaded or saved.
    fn preserve(&self, _key: &str, _value: &str, _category: RecoveryCategory, _reason: &str) {}
}

// ---------------------------------------------------------------------------
// File-backed storage
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob for `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        recovery::atomic_write(&path, value.as_bytes()).map_err(write_err)
    }

    fn preserve(&self, key: &str, value: &str, category: RecoveryCategory, reason: &str) {
        // Every read of an unparseable blob lands here; log it once.
        if category == RecoveryCategory::Load
            && let Some(latest) = recovery::read_recovery_entries(&self.dir, Some(1)).first()
            && latest.category == RecoveryCategory::Load
            && latest.body.lines().eq(value.lines())
        {
            tracing::debug!(key, "unreadable blob already in recovery log");
            return;
        }
        recovery::log_recovery(
            &self.dir,
            RecoveryEntry {
                timestamp: Utc::now(),
                category,
                description: reason.to_string(),
                fields: vec![
                    ("Key".to_string(), key.to_string()),
                    ("File".to_string(), self.key_path(key).display().to_string()),
                ],
                body: value.to_string(),
            },
        );
    }
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// Storage kept in a map; used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
    preserved: RefCell<Vec<(RecoveryCategory, String)>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `get` fails as if the storage subsystem were unavailable
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Every `set` fails as if the storage subsystem were unavailable
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn with_blob(self, key: &str, value: &str) -> Self {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn blob(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    /// Blobs handed to `preserve`, oldest first
    pub fn preserved(&self) -> Vec<(RecoveryCategory, String)> {
        self.preserved.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Unavailable("read refused".into()));
        }
        Ok(self.blob(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Unavailable("write refused".into()));
        }
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn preserve(&self, _key: &str, value: &str, category: RecoveryCategory, _reason: &str) {
        self.preserved
            .borrow_mut()
            .push((category, value.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Data directory
// ---------------------------------------------------------------------------

/// Default data directory, respecting XDG_DATA_HOME
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".local").join("share"))
        .join("ticklist")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}
