//! Session lifecycle events.
//!
//! Every [`SessionManager`](crate::SessionManager) owns an
//! [`EventRegistry`]; listeners registered on it are called synchronously,
//! in registration order, after the state change they describe has been
//! applied and persisted. With no listeners, events are dropped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vigil::events::listeners::LoggingListener;
//!
//! manager.listen(LoggingListener::new());
//!
//! // the navigation hook
//! manager.on_session_expired(|event| {
//!     router.replace(Redirect::Login.path());
//! });
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use vigil::events::{Listener, SessionEvent};
//!
//! struct IdleMetrics;
//!
//! impl Listener for IdleMetrics {
//!     fn handle(&self, event: &SessionEvent) {
//!         if let SessionEvent::Expired { idle, .. } = event {
//!             // record idle duration
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::SessionEvent;
pub use listener::{ExpiryHook, Listener};
pub use registry::EventRegistry;
