use super::SessionEvent;

/// Handles session events.
///
/// Called synchronously from the operation that produced the event, with
/// no internal locks held; a listener may call back into the manager.
pub trait Listener: Send + Sync + 'static {
    fn handle(&self, event: &SessionEvent);
}

/// Calls a closure whenever the session ends (logout, expiry, or sign-out
/// in another tab). Registered by
/// [`SessionManager::on_session_expired`](crate::SessionManager::on_session_expired).
pub struct ExpiryHook<F> {
    callback: F,
}

impl<F> ExpiryHook<F>
where
    F: Fn(&SessionEvent) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Listener for ExpiryHook<F>
where
    F: Fn(&SessionEvent) + Send + Sync + 'static,
{
    fn handle(&self, event: &SessionEvent) {
        if event.ends_session() {
            (self.callback)(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;

    #[test]
    fn test_expiry_hook_filters_events() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook = ExpiryHook::new(move |_: &SessionEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        hook.handle(&SessionEvent::Refreshed {
            username: "alice".to_owned(),
            at: Utc::now(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        hook.handle(&SessionEvent::LoggedOut {
            username: "alice".to_owned(),
            at: Utc::now(),
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
