use std::fmt;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const BUS_CAPACITY: usize = 256;

/// Identifies one store handle ("tab") within a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// A change made by another tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Changed key. `None` means any key may have changed and the
    /// receiver should re-read everything it cares about.
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub source: TabId,
}

impl StorageEvent {
    pub fn is_for(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

#[derive(Clone)]
pub(crate) struct ChangeBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl ChangeBus {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }

    pub(crate) fn publish(&self, event: StorageEvent) {
        // no subscribers is fine
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self, tab: TabId) -> StorageEvents {
        StorageEvents {
            receiver: self.sender.subscribe(),
            tab,
        }
    }
}

/// Stream of [`StorageEvent`]s for one tab.
pub struct StorageEvents {
    receiver: broadcast::Receiver<StorageEvent>,
    tab: TabId,
}

impl StorageEvents {
    /// Waits for the next change from another tab.
    ///
    /// Returns `None` once the backend is gone. If this receiver fell
    /// behind, a keyless event is returned in place of the dropped ones.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.source == self.tab => {}
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => return Some(self.resync(skipped)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.source == self.tab => {}
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => return Some(self.resync(skipped)),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn resync(&self, skipped: u64) -> StorageEvent {
        log::warn!(
            target: "vigil::store",
            "msg=\"storage events dropped\" tab={} skipped={}",
            self.tab,
            skipped
        );
        StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
            source: self.tab,
        }
    }
}
