//! Client-side session lifecycle for single-origin applications.
//!
//! `vigil` owns the authenticated-session record of one "tab": it restores
//! the session from a persistent key-value store, expires it after a period
//! of inactivity, and keeps several tabs sharing the same store in sync.
//!
//! # Quick Start
//!
//! ```rust
//! use vigil::{SessionConfig, SessionManager};
//! use vigil::store::MemoryStorage;
//!
//! let storage = MemoryStorage::new();
//! let manager = SessionManager::new(storage.tab(), SessionConfig::default());
//! manager.initialize();
//!
//! manager.login("alice", "tok123");
//! assert!(manager.is_live());
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod events;
pub mod guard;
pub mod secret;
pub mod session;
pub mod store;
pub mod validators;
pub mod verifier;

use std::fmt;

pub use auth::{Authenticator, Credentials, LoginOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use secret::SecretString;
pub use session::{
    ActivityKind, ActivitySubscription, Role, Session, SessionManager, SessionState, SessionToken,
    StorageWatch,
};
pub use store::{KeyValueStore, StorageEvent};

use validators::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The persistent store could not be read or written.
    Storage(String),
    /// A persisted session record exists but cannot be used.
    MalformedRecord(String),
    /// The credential verifier could not be reached.
    Transport(String),
    NotAuthenticated,
    Forbidden,
    UserNotFound,
    UserAlreadyExists,
    Validation(ValidationError),
    InvalidConfig(String),
    PasswordHashError,
    /// An operation that spawns background work was called outside a tokio runtime.
    RuntimeUnavailable,
}

impl std::error::Error for SessionError {}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Storage(msg) => write!(f, "Storage error: {msg}"),
            SessionError::MalformedRecord(msg) => write!(f, "Malformed session record: {msg}"),
            SessionError::Transport(msg) => write!(f, "Verifier unavailable: {msg}"),
            SessionError::NotAuthenticated => write!(f, "Not authenticated"),
            SessionError::Forbidden => write!(f, "Insufficient role"),
            SessionError::UserNotFound => write!(f, "User not found"),
            SessionError::UserAlreadyExists => write!(f, "User already exists"),
            SessionError::Validation(err) => write!(f, "{err}"),
            SessionError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            SessionError::PasswordHashError => write!(f, "Failed to hash password"),
            SessionError::RuntimeUnavailable => write!(f, "No tokio runtime available"),
        }
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Validation(err)
    }
}
