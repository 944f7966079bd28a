use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use super::manager::Live;
use super::{SessionManager, keys, record};
use crate::events::SessionEvent;
use crate::{KeyValueStore, SessionError, StorageEvent};

/// Keeps a manager in step with changes other tabs make to the store.
///
/// Returned by [`SessionManager::watch_storage`]; watching stops when this
/// is dropped.
#[derive(Debug)]
pub struct StorageWatch {
    task: AbortHandle,
}

impl StorageWatch {
    /// Stops watching. Same as dropping the watch.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for StorageWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Reload {
    Adopted { username: String },
    Ended { username: String },
    Unchanged,
}

impl<S: KeyValueStore + 'static> SessionManager<S> {
    /// Applies every change announced by the store in a background task.
    ///
    /// Requires a tokio runtime. Without one, feed events to
    /// [`apply_storage_event`](Self::apply_storage_event) directly.
    pub fn watch_storage(&self) -> Result<StorageWatch, SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::RuntimeUnavailable)?;
        let mut events = self.shared.store.subscribe();
        let shared = Arc::downgrade(&self.shared);

        let task = runtime.spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                SessionManager { shared }.apply_storage_event(&event);
            }
        });

        Ok(StorageWatch {
            task: task.abort_handle(),
        })
    }

    /// Reacts to a change another tab made to the store.
    ///
    /// A changed token (or an unknown change) re-reads the whole record:
    /// a live record is adopted, anything else ends the local session.
    /// Nothing is written back. A newer activity timestamp for the same
    /// session is adopted so an idle tab does not expire a session that is
    /// in use elsewhere.
    pub fn apply_storage_event(&self, event: &StorageEvent) {
        match event.key.as_deref() {
            None | Some(keys::TOKEN) => self.reload(),
            Some(keys::LAST_ACTIVITY) => self.adopt_remote_activity(event.new_value.as_deref()),
            Some(_) => {}
        }
    }

    fn reload(&self) {
        let now = self.now();
        let timeout = self.shared.config.session_timeout;
        let loaded = record::load(&self.shared.store);

        let outcome = {
            let mut live = self.live();
            match loaded {
                Ok(Some(stored)) if now - stored.last_activity < timeout => {
                    let same_session = live
                        .as_ref()
                        .is_some_and(|current| current.session.token == stored.session.token);
                    if same_session {
                        if let Some(current) = live.as_mut() {
                            if stored.last_activity > current.last_activity {
                                current.last_activity = stored.last_activity;
                            }
                        }
                        Reload::Unchanged
                    } else {
                        let username = stored.session.username.clone();
                        *live = Some(Live {
                            session: stored.session,
                            last_activity: stored.last_activity,
                        });
                        self.cancel_pending_write();
                        self.arm_sweep();
                        Reload::Adopted { username }
                    }
                }
                other => {
                    if let Err(err) = other {
                        log::debug!(
                            target: "vigil::sync",
                            "msg=\"unreadable record from another tab\" error=\"{}\"",
                            err
                        );
                    }
                    let ended = live.take();
                    if ended.is_some() {
                        self.cancel_tasks();
                    }
                    match ended {
                        Some(ended) => Reload::Ended {
                            username: ended.session.username,
                        },
                        None => Reload::Unchanged,
                    }
                }
            }
        };

        match outcome {
            Reload::Adopted { username } => {
                log::info!(
                    target: "vigil::sync",
                    "msg=\"session adopted from another tab\" username=\"{}\"",
                    username
                );
                self.dispatch(&SessionEvent::Synced { username, at: now });
            }
            Reload::Ended { username } => {
                log::info!(
                    target: "vigil::sync",
                    "msg=\"session ended in another tab\" username=\"{}\"",
                    username
                );
                self.dispatch(&SessionEvent::SignedOutElsewhere { username, at: now });
            }
            Reload::Unchanged => {}
        }
    }

    fn adopt_remote_activity(&self, value: Option<&str>) {
        let Some(at) = value.and_then(|raw| record::parse_millis(keys::LAST_ACTIVITY, raw).ok())
        else {
            return;
        };

        let mut live = self.live();
        let Some(current) = live.as_mut() else {
            return;
        };
        let same_session = matches!(
            self.shared.store.get(keys::TOKEN),
            Ok(Some(token)) if token == current.session.token.expose_secret()
        );
        if same_session && at > current.last_activity {
            current.last_activity = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::{MemoryStorage, MemoryStore, StorageEvents};
    use crate::{Role, SessionConfig, SessionState};

    fn config() -> SessionConfig {
        SessionConfig {
            session_timeout: Duration::milliseconds(1_000),
            check_interval: Duration::milliseconds(100),
            activity_write_debounce: Duration::zero(),
        }
    }

    fn tab(storage: &MemoryStorage, clock: &ManualClock) -> SessionManager<MemoryStore> {
        SessionManager::with_clock(storage.tab(), config(), clock.clone())
    }

    fn drain(events: &mut StorageEvents, into: &SessionManager<MemoryStore>) {
        while let Some(event) = events.try_recv() {
            into.apply_storage_event(&event);
        }
    }

    #[test]
    fn test_login_in_one_tab_is_adopted_by_another() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);
        let mut b_events = b.store().subscribe();

        a.login_with_role("bob", "tokA", Role::Admin);
        drain(&mut b_events, &b);

        assert_eq!(b.state(), SessionState::Authenticated);
        assert_eq!(b.username().as_deref(), Some("bob"));
        assert_eq!(b.role(), Some(Role::Admin));
    }

    #[test]
    fn test_logout_in_one_tab_signs_out_the_other() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        b.on_session_expired(move |event| sink.lock().unwrap().push(event.name()));

        a.login("alice", "tok");
        assert_eq!(b.initialize(), SessionState::Authenticated);

        let mut b_events = b.store().subscribe();
        a.logout();
        drain(&mut b_events, &b);

        assert_eq!(b.state(), SessionState::Anonymous);
        assert!(storage.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["session.signed_out_elsewhere"]);
    }

    #[test]
    fn test_idle_tab_adopts_remote_activity() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);

        a.login("alice", "tok");
        b.initialize();
        let mut b_events = b.store().subscribe();

        clock.advance(Duration::milliseconds(800));
        a.refresh_session();
        drain(&mut b_events, &b);

        clock.advance(Duration::milliseconds(800));
        assert!(b.enforce_expiry());
        assert_eq!(b.time_remaining(), Duration::milliseconds(200));
    }

    #[test]
    fn test_activity_for_other_session_is_ignored() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let b = tab(&storage, &clock);
        b.login("alice", "tok1");

        b.apply_storage_event(&StorageEvent {
            key: Some(keys::LAST_ACTIVITY.to_owned()),
            old_value: None,
            new_value: Some("500".to_owned()),
            source: crate::store::TabId(99),
        });
        assert_eq!(b.last_activity().unwrap().timestamp_millis(), 0);

        storage.tab().set(keys::TOKEN, "tok2").unwrap();
        b.apply_storage_event(&StorageEvent {
            key: Some(keys::LAST_ACTIVITY.to_owned()),
            old_value: None,
            new_value: Some("700".to_owned()),
            source: crate::store::TabId(99),
        });
        assert_eq!(b.last_activity().unwrap().timestamp_millis(), 0);
    }

    #[test]
    fn test_sync_never_writes() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);

        a.login("alice", "tok");
        let mut a_events = a.store().subscribe();
        b.apply_storage_event(&StorageEvent {
            key: None,
            old_value: None,
            new_value: None,
            source: crate::store::TabId(99),
        });

        assert_eq!(b.state(), SessionState::Authenticated);
        assert!(a_events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_watch_storage_applies_events() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);
        let _watch = b.watch_storage().unwrap();

        a.login("alice", "tok");
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(b.username().as_deref(), Some("alice"));

        a.logout();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(b.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_stopped_watch_ignores_other_tabs() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let a = tab(&storage, &clock);
        let b = tab(&storage, &clock);
        b.watch_storage().unwrap().stop();

        a.login("alice", "tok");
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(b.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_watch_storage_requires_runtime() {
        let storage = MemoryStorage::new();
        let manager = tab(&storage, &ManualClock::at_millis(0));

        assert!(matches!(
            manager.watch_storage(),
            Err(SessionError::RuntimeUnavailable)
        ));
    }
}
