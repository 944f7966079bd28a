//! Persistent key-value storage shared by every tab of an origin.
//!
//! A *storage* backend ([`MemoryStorage`], [`FileStorage`]) holds the
//! values; each tab talks to it through its own *store* handle obtained
//! with `tab()`. Writes through one handle are announced to every other
//! handle of the same backend as a [`StorageEvent`], never to the writer.
//!
//! | Backend | Handle | Durability |
//! |---------|--------|------------|
//! | [`MemoryStorage`] | [`MemoryStore`] | process lifetime |
//! | [`FileStorage`] | [`FileStore`] | JSON document on disk |

mod bus;
mod file;
mod memory;

#[cfg(any(test, feature = "mocks"))]
mod failing;

pub use bus::{StorageEvent, StorageEvents, TabId};
pub use file::{FileStorage, FileStore};
pub use memory::{MemoryStorage, MemoryStore};

#[cfg(any(test, feature = "mocks"))]
pub use failing::FailingStore;

use crate::SessionError;

/// Synchronous string store, one handle per tab.
///
/// Operations never block on other tabs; there are no transactions and
/// concurrent writers get last-write-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove(&self, key: &str) -> Result<(), SessionError>;

    /// Subscribes to changes made through *other* handles of the same backend.
    fn subscribe(&self) -> StorageEvents;
}
