//! Session timing configuration.
//!
//! # Example
//!
//! ```rust
//! use vigil::SessionConfig;
//! use chrono::Duration;
//!
//! let config = SessionConfig {
//!     session_timeout: Duration::minutes(15),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::SessionError;

/// Environment variable overriding [`SessionConfig::session_timeout`], in milliseconds.
pub const ENV_SESSION_TIMEOUT_MS: &str = "VIGIL_SESSION_TIMEOUT_MS";
/// Environment variable overriding [`SessionConfig::check_interval`], in milliseconds.
pub const ENV_CHECK_INTERVAL_MS: &str = "VIGIL_CHECK_INTERVAL_MS";
/// Environment variable overriding [`SessionConfig::activity_write_debounce`], in milliseconds.
pub const ENV_ACTIVITY_DEBOUNCE_MS: &str = "VIGIL_ACTIVITY_DEBOUNCE_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Inactivity after which a session is expired.
    ///
    /// Default: 30 minutes
    pub session_timeout: Duration,

    /// Period of the background expiry sweep.
    ///
    /// Default: 1 minute
    pub check_interval: Duration,

    /// Coalescing window for persisting activity timestamps.
    ///
    /// The in-memory timestamp is always exact; only the store write is
    /// delayed. Zero writes on every event.
    ///
    /// Default: 1 second
    pub activity_write_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::minutes(30),
            check_interval: Duration::minutes(1),
            activity_write_debounce: Duration::seconds(1),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Long-lived sessions for local development.
    pub fn development() -> Self {
        Self {
            session_timeout: Duration::hours(8),
            check_interval: Duration::minutes(5),
            activity_write_debounce: Duration::seconds(2),
        }
    }

    /// Short sessions with a tight sweep, for shared terminals.
    pub fn strict() -> Self {
        Self {
            session_timeout: Duration::minutes(5),
            check_interval: Duration::seconds(15),
            activity_write_debounce: Duration::seconds(1),
        }
    }

    /// Builds a configuration from the defaults plus any `VIGIL_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidConfig` if a variable is not a whole
    /// number of milliseconds or the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let mut config = Self::default();

        if let Some(ms) = read_millis(&lookup, ENV_SESSION_TIMEOUT_MS)? {
            config.session_timeout = ms;
        }
        if let Some(ms) = read_millis(&lookup, ENV_CHECK_INTERVAL_MS)? {
            config.check_interval = ms;
        }
        if let Some(ms) = read_millis(&lookup, ENV_ACTIVITY_DEBOUNCE_MS)? {
            config.activity_write_debounce = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `SessionError::InvalidConfig` describing the first bad field.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.session_timeout <= Duration::zero() {
            return Err(SessionError::InvalidConfig(
                "session_timeout must be positive".to_owned(),
            ));
        }
        if self.check_interval <= Duration::zero() {
            return Err(SessionError::InvalidConfig(
                "check_interval must be positive".to_owned(),
            ));
        }
        if self.activity_write_debounce < Duration::zero() {
            return Err(SessionError::InvalidConfig(
                "activity_write_debounce must not be negative".to_owned(),
            ));
        }
        if self.activity_write_debounce >= self.session_timeout {
            return Err(SessionError::InvalidConfig(
                "activity_write_debounce must be shorter than session_timeout".to_owned(),
            ));
        }
        Ok(())
    }
}

fn read_millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, SessionError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<i64>()
        .map(|ms| Some(Duration::milliseconds(ms)))
        .map_err(|_| SessionError::InvalidConfig(format!("{key} must be milliseconds, got {raw:?}")))
}
