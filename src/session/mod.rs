//! Session lifecycle management.
//!
//! A [`SessionManager`] is the only writer of the session fields in its
//! [`KeyValueStore`](crate::KeyValueStore). It moves between two states:
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Anonymous | `initialize` finds a live record | Authenticated |
//! | Anonymous | `login` | Authenticated |
//! | Authenticated | inactivity reaches the timeout | Anonymous |
//! | Authenticated | `logout` | Anonymous |
//! | Anonymous | `initialize` finds an expired or partial record | Anonymous (store cleared) |

mod activity;
mod manager;
mod record;
mod sweep;
mod sync;
mod token;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use activity::{ActivityKind, ActivitySubscription};
pub use manager::SessionManager;
pub use record::keys;
pub use sync::StorageWatch;
pub use token::SessionToken;

use crate::SessionError;

/// Authorization tier of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(SessionError::MalformedRecord(format!("unknown role {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// The authenticated identity of the current tab.
///
/// Every field is fixed at login; only the separately tracked activity
/// timestamp moves while the session is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: SessionToken,
    pub role: Role,
    pub login_time: DateTime<Utc>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(Role::User.as_str(), "USER");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
