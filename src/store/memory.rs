//! In-memory storage.
//!
//! Suitable for tests and for several managers living in one process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::SessionError;

use super::KeyValueStore;
use super::bus::{ChangeBus, StorageEvent, StorageEvents, TabId};

/// In-memory backend shared by all of its [`MemoryStore`] handles.
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
    bus: ChangeBus,
    next_tab: Arc<AtomicU64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            bus: ChangeBus::new(),
            next_tab: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Opens a new handle with its own [`TabId`].
    pub fn tab(&self) -> MemoryStore {
        MemoryStore {
            storage: self.clone(),
            tab: TabId(self.next_tab.fetch_add(1, Ordering::Relaxed)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's handle onto a [`MemoryStorage`].
#[derive(Clone)]
pub struct MemoryStore {
    storage: MemoryStorage,
    tab: TabId,
}

impl MemoryStore {
    pub fn tab_id(&self) -> TabId {
        self.tab
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let entries = self
            .storage
            .entries
            .read()
            .map_err(|_| SessionError::Storage("Lock poisoned".to_owned()))?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let old_value = self
            .storage
            .entries
            .write()
            .map_err(|_| SessionError::Storage("Lock poisoned".to_owned()))?
            .insert(key.to_owned(), value.to_owned());

        if old_value.as_deref() != Some(value) {
            self.storage.bus.publish(StorageEvent {
                key: Some(key.to_owned()),
                old_value,
                new_value: Some(value.to_owned()),
                source: self.tab,
            });
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let old_value = self
            .storage
            .entries
            .write()
            .map_err(|_| SessionError::Storage("Lock poisoned".to_owned()))?
            .remove(key);

        if old_value.is_some() {
            self.storage.bus.publish(StorageEvent {
                key: Some(key.to_owned()),
                old_value,
                new_value: None,
                source: self.tab,
            });
        }

        Ok(())
    }

    fn subscribe(&self) -> StorageEvents {
        self.storage.bus.subscribe(self.tab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        let store = storage.tab();

        assert_eq!(store.get("auth_token").unwrap(), None);

        store.set("auth_token", "abc").unwrap();
        assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.len(), 1);

        store.remove("auth_token").unwrap();
        assert_eq!(store.get("auth_token").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_tabs_share_values() {
        let storage = MemoryStorage::new();
        let a = storage.tab();
        let b = storage.tab();
        assert_ne!(a.tab_id(), b.tab_id());

        a.set("auth_username", "alice").unwrap();
        assert_eq!(b.get("auth_username").unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn test_changes_notify_other_tabs_only() {
        let storage = MemoryStorage::new();
        let a = storage.tab();
        let b = storage.tab();
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();

        a.set("auth_token", "abc").unwrap();

        assert!(a_events.try_recv().is_none());
        let event = b_events.try_recv().unwrap();
        assert!(event.is_for("auth_token"));
        assert_eq!(event.old_value, None);
        assert_eq!(event.new_value.as_deref(), Some("abc"));
        assert_eq!(event.source, a.tab_id());
    }

    #[test]
    fn test_unchanged_writes_are_silent() {
        let storage = MemoryStorage::new();
        let a = storage.tab();
        let mut b_events = storage.tab().subscribe();

        a.set("auth_role", "USER").unwrap();
        a.set("auth_role", "USER").unwrap();
        a.remove("missing").unwrap();

        assert!(b_events.try_recv().is_some());
        assert!(b_events.try_recv().is_none());
    }
}
