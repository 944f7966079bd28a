use std::sync::Arc;

use super::{Listener, SessionEvent};

/// Listeners attached to one session manager.
#[derive(Default, Clone)]
pub struct EventRegistry {
    listeners: Vec<Arc<dyn Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners are called in the order they are registered.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        self.listeners.clone()
    }

    pub fn dispatch(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener.handle(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    struct Recorder {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Listener for Recorder {
        fn handle(&self, event: &SessionEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.tag, event.name()));
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();
        registry
            .listen(Recorder {
                tag: "first",
                seen: Arc::clone(&seen),
            })
            .listen(Recorder {
                tag: "second",
                seen: Arc::clone(&seen),
            });
        assert_eq!(registry.len(), 2);

        registry.dispatch(&SessionEvent::LoggedOut {
            username: "alice".to_owned(),
            at: Utc::now(),
        });

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:session.logout", "second:session.logout"]
        );
    }

    #[test]
    fn test_empty_registry_is_noop() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());
        registry.dispatch(&SessionEvent::LoggedOut {
            username: "alice".to_owned(),
            at: Utc::now(),
        });
    }
}
