//! File-based storage.
//!
//! All keys live in a single JSON document, `storage.json`, inside the
//! configured directory. Every operation re-reads the document, so two
//! processes pointed at the same directory observe each other's writes
//! (change notifications are only delivered within a process).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::SessionError;

use super::KeyValueStore;
use super::bus::{ChangeBus, StorageEvent, StorageEvents, TabId};

const FILE_NAME: &str = "storage.json";

/// File-backed storage.
///
/// # Example
///
/// ```rust,ignore
/// use vigil::store::FileStorage;
///
/// let storage = FileStorage::open("/var/lib/myapp/session")?;
/// let store = storage.tab();
/// ```
#[derive(Clone)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    bus: ChangeBus,
    next_tab: Arc<AtomicU64>,
}

impl FileStorage {
    /// Opens storage in `directory`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = directory.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SessionError::Storage(format!("Failed to create storage directory: {e}"))
        })?;

        Ok(Self {
            path: dir.join(FILE_NAME),
            write_lock: Arc::new(Mutex::new(())),
            bus: ChangeBus::new(),
            next_tab: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn tab(&self) -> FileStore {
        FileStore {
            storage: self.clone(),
            tab: TabId(self.next_tab.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SessionError::Storage(format!("Failed to read storage file: {e}")))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| SessionError::Storage(format!("Failed to parse storage file: {e}")))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| SessionError::Storage(format!("Failed to serialize storage: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| SessionError::Storage(format!("Failed to write storage file: {e}")))
    }

    fn update(
        &self,
        tab: TabId,
        key: &str,
        new_value: Option<&str>,
    ) -> Result<(), SessionError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SessionError::Storage("Lock poisoned".to_owned()))?;

        let mut entries = self.read_all()?;
        let old_value = match new_value {
            Some(value) => entries.insert(key.to_owned(), value.to_owned()),
            None => entries.remove(key),
        };

        if old_value.as_deref() == new_value {
            return Ok(());
        }

        self.write_all(&entries)?;
        self.bus.publish(StorageEvent {
            key: Some(key.to_owned()),
            old_value,
            new_value: new_value.map(str::to_owned),
            source: tab,
        });

        Ok(())
    }
}

/// One tab's handle onto a [`FileStorage`].
#[derive(Clone)]
pub struct FileStore {
    storage: FileStorage,
    tab: TabId,
}

impl FileStore {
    pub fn tab_id(&self) -> TabId {
        self.tab
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.storage.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.storage.update(self.tab, key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.storage.update(self.tab, key, None)
    }

    fn subscribe(&self) -> StorageEvents {
        self.storage.bus.subscribe(self.tab)
    }
}
