use crate::SessionError;

use super::KeyValueStore;
use super::bus::{ChangeBus, StorageEvents, TabId};

/// Store whose every operation fails, as when storage is disabled or full.
pub struct FailingStore {
    bus: ChangeBus,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            bus: ChangeBus::new(),
        }
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::Storage("storage disabled".to_owned()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Err(SessionError::Storage("quota exceeded".to_owned()))
    }

    fn remove(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::Storage("storage disabled".to_owned()))
    }

    fn subscribe(&self) -> StorageEvents {
        self.bus.subscribe(TabId(0))
    }
}
