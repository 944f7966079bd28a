use chrono::{DateTime, Duration, Utc};

use crate::Role;

/// Events emitted by the session manager and the authentication facade.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LoggedIn {
        username: String,
        role: Role,
        at: DateTime<Utc>,
    },
    /// A persisted session was picked up by `initialize`.
    Restored {
        username: String,
        role: Role,
        at: DateTime<Utc>,
    },
    Refreshed {
        username: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        username: String,
        at: DateTime<Utc>,
    },
    Expired {
        username: String,
        idle: Duration,
        at: DateTime<Utc>,
    },
    /// Another tab signed in; this tab adopted its session.
    Synced {
        username: String,
        at: DateTime<Utc>,
    },
    /// Another tab signed out or the record disappeared from the store.
    SignedOutElsewhere {
        username: String,
        at: DateTime<Utc>,
    },
    LoginRejected {
        username: String,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoggedIn { .. } => "session.login",
            Self::Restored { .. } => "session.restored",
            Self::Refreshed { .. } => "session.refreshed",
            Self::LoggedOut { .. } => "session.logout",
            Self::Expired { .. } => "session.expired",
            Self::Synced { .. } => "session.synced",
            Self::SignedOutElsewhere { .. } => "session.signed_out_elsewhere",
            Self::LoginRejected { .. } => "session.login.rejected",
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Self::LoggedIn { username, .. }
            | Self::Restored { username, .. }
            | Self::Refreshed { username, .. }
            | Self::LoggedOut { username, .. }
            | Self::Expired { username, .. }
            | Self::Synced { username, .. }
            | Self::SignedOutElsewhere { username, .. }
            | Self::LoginRejected { username, .. } => username,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoggedIn { at, .. }
            | Self::Restored { at, .. }
            | Self::Refreshed { at, .. }
            | Self::LoggedOut { at, .. }
            | Self::Expired { at, .. }
            | Self::Synced { at, .. }
            | Self::SignedOutElsewhere { at, .. }
            | Self::LoginRejected { at, .. } => *at,
        }
    }

    /// True for events after which the presentation layer should return
    /// to the login surface.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::LoggedOut { .. } | Self::Expired { .. } | Self::SignedOutElsewhere { .. }
        )
    }
}
