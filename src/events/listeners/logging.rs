use crate::events::{Listener, SessionEvent};

/// Logs every session event through the `log` crate.
///
/// Tokens never appear in events, so the full event is logged.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// Logs at INFO level.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for LoggingListener {
    fn handle(&self, event: &SessionEvent) {
        log::log!(
            target: "vigil::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_logging_listener_levels() {
        assert_eq!(LoggingListener::new().level, log::Level::Info);
        assert_eq!(LoggingListener::default().level, log::Level::Info);
        assert_eq!(
            LoggingListener::with_level(log::Level::Debug).level,
            log::Level::Debug
        );
    }

    #[test]
    fn test_logging_listener_handle() {
        let listener = LoggingListener::new();
        listener.handle(&SessionEvent::LoggedOut {
            username: "alice".to_owned(),
            at: Utc::now(),
        });
    }
}
