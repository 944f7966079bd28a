use std::fmt;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;

use super::manager::Shared;
use super::{SessionManager, record};
use crate::KeyValueStore;

/// User interactions that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        ActivityKind::PointerDown,
        ActivityKind::PointerMove,
        ActivityKind::KeyPress,
        ActivityKind::Scroll,
        ActivityKind::TouchStart,
        ActivityKind::Click,
    ];

    /// DOM event name the host maps to this kind.
    pub fn event_name(&self) -> &'static str {
        match self {
            ActivityKind::PointerDown => "mousedown",
            ActivityKind::PointerMove => "mousemove",
            ActivityKind::KeyPress => "keypress",
            ActivityKind::Scroll => "scroll",
            ActivityKind::TouchStart => "touchstart",
            ActivityKind::Click => "click",
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.event_name() == name)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Feeds user activity into a [`SessionManager`].
///
/// Events only count while a session exists, so a subscription outlives
/// logins and logouts. Dropping it flushes any coalesced write that is
/// still pending.
pub struct ActivitySubscription<S: KeyValueStore + 'static> {
    shared: Weak<Shared<S>>,
}

impl<S: KeyValueStore + 'static> ActivitySubscription<S> {
    /// Records one interaction. Returns whether it counted.
    pub fn record(&self, kind: ActivityKind) -> bool {
        match self.manager() {
            Some(manager) => manager.note_activity(kind),
            None => false,
        }
    }

    /// Records a DOM event by name; unknown names are ignored.
    pub fn record_event(&self, name: &str) -> bool {
        ActivityKind::from_event_name(name).is_some_and(|kind| self.record(kind))
    }

    fn manager(&self) -> Option<SessionManager<S>> {
        self.shared.upgrade().map(|shared| SessionManager { shared })
    }
}

impl<S: KeyValueStore + 'static> Drop for ActivitySubscription<S> {
    fn drop(&mut self) {
        if let Some(manager) = self.manager() {
            manager.flush_pending_activity();
        }
    }
}

impl<S: KeyValueStore + 'static> SessionManager<S> {
    /// Subscribes to user activity.
    ///
    /// Each counted event moves the activity timestamp forward in memory
    /// at once. The store write is coalesced: at most one write per
    /// `activity_write_debounce`, carrying the latest timestamp.
    pub fn track_activity(&self) -> ActivitySubscription<S> {
        ActivitySubscription {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Activity on a session that already timed out does not revive it;
    /// the session is expired instead.
    fn note_activity(&self, kind: ActivityKind) -> bool {
        if !self.enforce_expiry() {
            return false;
        }

        let now = self.now();
        {
            let mut live = self.live();
            let Some(current) = live.as_mut() else {
                return false;
            };
            if now > current.last_activity {
                current.last_activity = now;
            }
        }

        log::trace!(target: "vigil::activity", "msg=\"activity\" kind={}", kind);
        self.schedule_activity_write();
        true
    }

    fn schedule_activity_write(&self) {
        let debounce = self
            .shared
            .config
            .activity_write_debounce
            .to_std()
            .unwrap_or_default();

        let runtime = match Handle::try_current() {
            Ok(runtime) if !debounce.is_zero() => runtime,
            _ => return self.flush_activity(),
        };

        let mut tasks = self.tasks();
        if tasks
            .pending_write
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
        {
            return;
        }

        let shared = Arc::downgrade(&self.shared);
        let task = runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(shared) = shared.upgrade() {
                let manager = SessionManager { shared };
                manager.tasks().pending_write = None;
                manager.flush_activity();
            }
        });
        tasks.pending_write = Some(task.abort_handle());
    }

    /// Writes a pending activity timestamp now instead of at the end of
    /// the debounce window.
    pub(super) fn flush_pending_activity(&self) {
        let pending = self.tasks().pending_write.take();
        if let Some(pending) = pending {
            pending.abort();
            self.flush_activity();
        }
    }

    fn flush_activity(&self) {
        let live = self.live();
        let Some(current) = live.as_ref() else {
            return;
        };
        if let Err(err) = record::persist_activity(&self.shared.store, current.last_activity) {
            log::warn!(
                target: "vigil::activity",
                "msg=\"failed to persist activity\" error=\"{}\"",
                err
            );
        }
    }
}
