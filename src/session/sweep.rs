use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::SessionManager;
use crate::KeyValueStore;

impl<S: KeyValueStore + 'static> SessionManager<S> {
    /// Starts the periodic expiry check for the current session, replacing
    /// any previous one.
    ///
    /// The task only holds a weak reference, so it never keeps the manager
    /// alive, and it stops by itself once the session has ended.
    pub(super) fn arm_sweep(&self) {
        let Ok(runtime) = Handle::try_current() else {
            log::debug!(
                target: "vigil::sweep",
                "msg=\"no async runtime, periodic expiry check disabled\""
            );
            return;
        };
        let period = match self.shared.config.check_interval.to_std() {
            Ok(period) if !period.is_zero() => period,
            _ => return,
        };

        let shared = Arc::downgrade(&self.shared);
        let task = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                let manager = SessionManager { shared };
                if !manager.enforce_expiry() {
                    break;
                }
            }
            log::trace!(target: "vigil::sweep", "msg=\"expiry check stopped\"");
        });

        if let Some(previous) = self.tasks().sweep.replace(task.abort_handle()) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Duration;

    use crate::clock::ManualClock;
    use crate::events::SessionEvent;
    use crate::store::MemoryStorage;
    use crate::{SessionConfig, SessionManager, SessionState};

    fn config() -> SessionConfig {
        SessionConfig {
            session_timeout: Duration::milliseconds(1_000),
            check_interval: Duration::milliseconds(100),
            activity_write_debounce: Duration::zero(),
        }
    }

    /// Advances both the tokio clock and the session clock.
    async fn elapse(clock: &ManualClock, millis: u64) {
        for _ in 0..millis / 50 {
            clock.advance(Duration::milliseconds(50));
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_expires_idle_session() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let manager = SessionManager::with_clock(storage.tab(), config(), clock.clone());
        let ended = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&ended);
        manager.on_session_expired(move |event| sink.lock().unwrap().push(event.name()));

        manager.login("alice", "tok");
        elapse(&clock, 900).await;
        assert_eq!(manager.state(), SessionState::Authenticated);

        elapse(&clock, 300).await;
        assert_eq!(manager.state(), SessionState::Anonymous);
        assert!(storage.is_empty());
        assert_eq!(*ended.lock().unwrap(), vec!["session.expired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_rearms_after_relogin() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let manager = SessionManager::with_clock(storage.tab(), config(), clock.clone());

        manager.login("alice", "tok1");
        manager.logout();
        manager.login("alice", "tok2");

        elapse(&clock, 1_200).await;
        assert_eq!(manager.state(), SessionState::Anonymous);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_spares_refreshed_session() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let manager = SessionManager::with_clock(storage.tab(), config(), clock.clone());

        manager.login("alice", "tok");
        for _ in 0..4 {
            elapse(&clock, 600).await;
            manager.refresh_session();
        }

        assert_eq!(manager.state(), SessionState::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_sweep_but_keeps_session() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::at_millis(0);
        let manager = SessionManager::with_clock(storage.tab(), config(), clock.clone());
        let ended = std::sync::Arc::new(Mutex::new(Vec::<SessionEvent>::new()));
        let sink = std::sync::Arc::clone(&ended);
        manager.on_session_expired(move |event| sink.lock().unwrap().push(event.clone()));

        manager.login("alice", "tok");
        manager.dispose();
        elapse(&clock, 1_500).await;

        assert_eq!(manager.state(), SessionState::Authenticated);
        assert!(ended.lock().unwrap().is_empty());
        assert!(!manager.is_live());
    }
}
