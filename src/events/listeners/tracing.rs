use crate::events::{Listener, SessionEvent};

/// Emits session events as `tracing` events.
///
/// Requires the `tracing` feature.
pub struct TracingListener;

impl Listener for TracingListener {
    fn handle(&self, event: &SessionEvent) {
        tracing::info!(
            target: "vigil::events",
            event_name = event.name(),
            username = event.username(),
            ?event,
            "session event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_tracing_listener_handle() {
        TracingListener.handle(&SessionEvent::Refreshed {
            username: "alice".to_owned(),
            at: Utc::now(),
        });
    }
}
