use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tokio::task::AbortHandle;

use super::record;
use super::{Role, Session, SessionState, SessionToken};
use crate::clock::{Clock, SystemClock};
use crate::events::{EventRegistry, ExpiryHook, Listener, SessionEvent};
use crate::{KeyValueStore, SessionConfig};

/// Owns the session of one tab.
///
/// Cloning is cheap and every clone drives the same session. All
/// operations are synchronous; background work (expiry sweep, coalesced
/// activity writes, storage watching) runs on the ambient tokio runtime
/// when there is one.
///
/// # Example
///
/// ```rust
/// use vigil::{Role, SessionConfig, SessionManager};
/// use vigil::store::MemoryStorage;
///
/// let manager = SessionManager::new(MemoryStorage::new().tab(), SessionConfig::default());
/// manager.initialize();
///
/// manager.login_with_role("bob", "tokA", Role::Admin);
/// assert!(manager.is_live());
/// assert_eq!(manager.role(), Some(Role::Admin));
///
/// manager.logout();
/// assert!(!manager.is_live());
/// ```
pub struct SessionManager<S: KeyValueStore + 'static> {
    pub(super) shared: Arc<Shared<S>>,
}

impl<S: KeyValueStore + 'static> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

pub(super) struct Shared<S> {
    pub(super) store: S,
    clock: Arc<dyn Clock>,
    pub(super) config: SessionConfig,
    live: Mutex<Option<Live>>,
    tasks: Mutex<Tasks>,
    listeners: RwLock<EventRegistry>,
}

#[derive(Debug, Clone)]
pub(super) struct Live {
    pub(super) session: Session,
    pub(super) last_activity: DateTime<Utc>,
}

#[derive(Default)]
pub(super) struct Tasks {
    pub(super) sweep: Option<AbortHandle>,
    pub(super) pending_write: Option<AbortHandle>,
}

impl Tasks {
    fn abort_all(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            sweep.abort();
        }
        if let Some(write) = self.pending_write.take() {
            write.abort();
        }
    }
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

impl<S: KeyValueStore + 'static> SessionManager<S> {
    /// Creates an anonymous manager on the system clock.
    ///
    /// Nothing is read from the store until [`initialize`](Self::initialize).
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }

    pub fn with_clock(store: S, config: SessionConfig, clock: impl Clock + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                clock: Arc::new(clock),
                config,
                live: Mutex::new(None),
                tasks: Mutex::new(Tasks::default()),
                listeners: RwLock::new(EventRegistry::new()),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn store(&self) -> &S {
        &self.shared.store
    }

    pub fn listen(&self, listener: impl Listener) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .listen(listener);
    }

    /// Registers the navigation hook: `callback` runs whenever the session
    /// ends, whether by logout, inactivity, or sign-out in another tab.
    pub fn on_session_expired<F>(&self, callback: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listen(ExpiryHook::new(callback));
    }

    /// Restores the persisted session, if there is a live one.
    ///
    /// An expired, incomplete or unreadable record is removed from the
    /// store in full. Never fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.initialize", skip_all)
    )]
    pub fn initialize(&self) -> SessionState {
        let now = self.now();
        let timeout = self.shared.config.session_timeout;

        match record::load(&self.shared.store) {
            Ok(Some(stored)) if now - stored.last_activity < timeout => {
                let username = stored.session.username.clone();
                let role = stored.session.role;
                let idle = now - stored.last_activity;

                {
                    let mut live = self.live();
                    *live = Some(Live {
                        session: stored.session,
                        last_activity: stored.last_activity,
                    });
                    self.arm_sweep();
                }

                log::info!(
                    target: "vigil::session",
                    "msg=\"session restored\" username=\"{}\" role={} idle_secs={}",
                    username,
                    role,
                    idle.num_seconds()
                );
                self.dispatch(&SessionEvent::Restored {
                    username,
                    role,
                    at: now,
                });
                SessionState::Authenticated
            }
            Ok(Some(stored)) => {
                log::info!(
                    target: "vigil::session",
                    "msg=\"persisted session expired, clearing\" username=\"{}\" idle_secs={}",
                    stored.session.username,
                    (now - stored.last_activity).num_seconds()
                );
                self.discard();
                SessionState::Anonymous
            }
            Ok(None) => {
                let mut live = self.live();
                *live = None;
                self.cancel_tasks();
                SessionState::Anonymous
            }
            Err(err) => {
                log::warn!(
                    target: "vigil::session",
                    "msg=\"failed to load session, clearing\" error=\"{}\"",
                    err
                );
                self.discard();
                SessionState::Anonymous
            }
        }
    }

    /// Starts a `USER` session. See [`login_with_role`](Self::login_with_role).
    pub fn login(&self, username: impl Into<String>, token: impl Into<SessionToken>) {
        self.login_with_role(username, token, Role::User);
    }

    /// Starts a new session, replacing any current one.
    ///
    /// Call only after the credentials were verified. The fields are not
    /// validated here.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.login", skip_all)
    )]
    pub fn login_with_role(
        &self,
        username: impl Into<String>,
        token: impl Into<SessionToken>,
        role: Role,
    ) {
        let now = self.now();
        let session = Session {
            username: username.into(),
            token: token.into(),
            role,
            login_time: now,
        };

        {
            let mut live = self.live();
            if let Err(err) = record::persist(&self.shared.store, &session, now) {
                log::warn!(
                    target: "vigil::session",
                    "msg=\"failed to persist session\" username=\"{}\" error=\"{}\"",
                    session.username,
                    err
                );
            }
            *live = Some(Live {
                session: session.clone(),
                last_activity: now,
            });
            self.cancel_pending_write();
            self.arm_sweep();
        }

        log::info!(
            target: "vigil::session",
            "msg=\"login\" username=\"{}\" role={} token={}",
            session.username,
            role,
            session.token.fingerprint()
        );
        self.dispatch(&SessionEvent::LoggedIn {
            username: session.username,
            role,
            at: now,
        });
    }

    /// Ends the session: stops the sweep, drops any pending activity write,
    /// and removes the record from memory and the store.
    ///
    /// Idempotent, and safe to call from a listener or the sweep itself.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.logout", skip_all)
    )]
    pub fn logout(&self) {
        let ended = {
            let mut live = self.live();
            let ended = live.take();
            self.cancel_tasks();
            self.clear_store();
            ended
        };

        if let Some(ended) = ended {
            log::info!(
                target: "vigil::session",
                "msg=\"logout\" username=\"{}\"",
                ended.session.username
            );
            self.dispatch(&SessionEvent::LoggedOut {
                username: ended.session.username,
                at: self.now(),
            });
        }
    }

    /// Whether a session exists and has not been idle for the timeout.
    ///
    /// Pure: an expired session is reported as not live but left in place
    /// until [`enforce_expiry`](Self::enforce_expiry) runs.
    pub fn is_live(&self) -> bool {
        let now = self.now();
        let timeout = self.shared.config.session_timeout;
        self.live()
            .as_ref()
            .is_some_and(|current| now - current.last_activity < timeout)
    }

    /// Expires the session if it has been idle for the timeout.
    ///
    /// Returns whether a session is still live afterwards. On expiry the
    /// session is cleared exactly as by [`logout`](Self::logout) and
    /// [`SessionEvent::Expired`] is dispatched.
    pub fn enforce_expiry(&self) -> bool {
        let now = self.now();
        let timeout = self.shared.config.session_timeout;

        let (ended, idle) = {
            let mut live = self.live();
            let Some(idle) = live.as_ref().map(|current| now - current.last_activity) else {
                return false;
            };
            if idle < timeout {
                return true;
            }
            let ended = live.take();
            self.cancel_tasks();
            self.clear_store();
            (ended, idle)
        };

        if let Some(ended) = ended {
            log::info!(
                target: "vigil::session",
                "msg=\"session expired\" username=\"{}\" idle_secs={} timeout_secs={}",
                ended.session.username,
                idle.num_seconds(),
                timeout.num_seconds()
            );
            self.dispatch(&SessionEvent::Expired {
                username: ended.session.username,
                idle,
                at: now,
            });
        }
        false
    }

    /// Same as [`enforce_expiry`](Self::enforce_expiry).
    pub fn is_authenticated(&self) -> bool {
        self.enforce_expiry()
    }

    /// Marks the session active now and persists the timestamp immediately.
    ///
    /// No-op while anonymous.
    pub fn refresh_session(&self) {
        let now = self.now();

        let username = {
            let mut live = self.live();
            let Some(current) = live.as_mut() else {
                return;
            };
            if now > current.last_activity {
                current.last_activity = now;
            }
            if let Err(err) = record::persist_activity(&self.shared.store, current.last_activity) {
                log::warn!(
                    target: "vigil::session",
                    "msg=\"failed to persist activity\" error=\"{}\"",
                    err
                );
            }
            current.session.username.clone()
        };

        self.cancel_pending_write();
        log::debug!(
            target: "vigil::session",
            "msg=\"session refreshed\" username=\"{}\"",
            username
        );
        self.dispatch(&SessionEvent::Refreshed { username, at: now });
    }

    /// Time left before the session expires; zero when anonymous or expired.
    pub fn time_remaining(&self) -> Duration {
        let now = self.now();
        let timeout = self.shared.config.session_timeout;
        self.live().as_ref().map_or(Duration::zero(), |current| {
            (timeout - (now - current.last_activity))
                .min(timeout)
                .max(Duration::zero())
        })
    }

    /// Whether a session is held in memory. Does not check expiry.
    pub fn state(&self) -> SessionState {
        if self.live().is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.live().as_ref().map(|current| current.session.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.live()
            .as_ref()
            .map(|current| current.session.username.clone())
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.live()
            .as_ref()
            .map(|current| current.session.token.clone())
    }

    pub fn role(&self) -> Option<Role> {
        self.live().as_ref().map(|current| current.session.role)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.live().as_ref().map(|current| current.last_activity)
    }

    /// Stops background work owned by this manager without ending the
    /// session. A pending activity write is flushed first.
    pub fn dispose(&self) {
        self.flush_pending_activity();
        self.cancel_tasks();
        log::debug!(target: "vigil::session", "msg=\"manager disposed\"");
    }

    pub(crate) fn dispatch(&self, event: &SessionEvent) {
        let listeners = self
            .shared
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot();

        for listener in listeners {
            listener.handle(event);
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.shared.clock.now().trunc_subsecs(3)
    }

    pub(super) fn live(&self) -> MutexGuard<'_, Option<Live>> {
        self.shared
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock order is `live` then `tasks`: the session and the tasks that
    /// serve it always change in one critical section.
    pub(super) fn tasks(&self) -> MutexGuard<'_, Tasks> {
        self.shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn cancel_tasks(&self) {
        self.tasks().abort_all();
    }

    pub(super) fn cancel_pending_write(&self) {
        if let Some(write) = self.tasks().pending_write.take() {
            write.abort();
        }
    }

    fn discard(&self) {
        let mut live = self.live();
        *live = None;
        self.cancel_tasks();
        self.clear_store();
    }

    fn clear_store(&self) {
        if let Err(err) = record::clear(&self.shared.store) {
            log::warn!(
                target: "vigil::session",
                "msg=\"failed to clear session\" error=\"{}\"",
                err
            );
        }
    }
}
