//! Persisted layout of a session.
//!
//! Five scalar string fields under fixed keys; timestamps are decimal
//! milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};

use super::{Role, Session, SessionToken};
use crate::{KeyValueStore, SessionError};

/// Store keys owned by the session manager.
pub mod keys {
    pub const TOKEN: &str = "auth_token";
    pub const USERNAME: &str = "auth_username";
    pub const LOGIN_TIME: &str = "auth_login_time";
    pub const LAST_ACTIVITY: &str = "auth_last_activity";
    pub const ROLE: &str = "auth_role";

    pub const ALL: [&str; 5] = [TOKEN, USERNAME, LOGIN_TIME, LAST_ACTIVITY, ROLE];
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredSession {
    pub session: Session,
    pub last_activity: DateTime<Utc>,
}

/// Reads the persisted session.
///
/// `Ok(None)` means none of the keys are present. A record missing any of
/// token, username or login time, or holding an unparseable value, is an
/// error so the caller can clear it.
pub(crate) fn load<S>(store: &S) -> Result<Option<StoredSession>, SessionError>
where
    S: KeyValueStore + ?Sized,
{
    let read = |key: &str| -> Result<Option<String>, SessionError> {
        Ok(store.get(key)?.filter(|value| !value.is_empty()))
    };

    let token = read(keys::TOKEN)?;
    let username = read(keys::USERNAME)?;
    let login_time = read(keys::LOGIN_TIME)?;
    let last_activity = read(keys::LAST_ACTIVITY)?;
    let role = read(keys::ROLE)?;

    let (token, username, login_time) = match (token, username, login_time) {
        (Some(token), Some(username), Some(login_time)) => (token, username, login_time),
        (None, None, None) if last_activity.is_none() && role.is_none() => return Ok(None),
        (token, username, login_time) => {
            let missing: Vec<&str> = [
                (keys::TOKEN, token.is_none()),
                (keys::USERNAME, username.is_none()),
                (keys::LOGIN_TIME, login_time.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, absent)| absent.then_some(key))
            .collect();
            return Err(SessionError::MalformedRecord(format!(
                "incomplete record, missing {}",
                missing.join(", ")
            )));
        }
    };

    let login_time = parse_millis(keys::LOGIN_TIME, &login_time)?;
    let last_activity = match last_activity {
        Some(raw) => parse_millis(keys::LAST_ACTIVITY, &raw)?,
        None => login_time,
    };
    let role = match role {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::User,
    };

    Ok(Some(StoredSession {
        session: Session {
            username,
            token: SessionToken::new(token),
            role,
            login_time,
        },
        last_activity,
    }))
}

/// Writes every field; the token goes last so that other tabs reacting to
/// the token change read a complete record.
pub(crate) fn persist<S>(
    store: &S,
    session: &Session,
    last_activity: DateTime<Utc>,
) -> Result<(), SessionError>
where
    S: KeyValueStore + ?Sized,
{
    store.set(keys::USERNAME, &session.username)?;
    store.set(keys::LOGIN_TIME, &to_millis(session.login_time))?;
    store.set(keys::LAST_ACTIVITY, &to_millis(last_activity))?;
    store.set(keys::ROLE, session.role.as_str())?;
    store.set(keys::TOKEN, session.token.expose_secret())
}

pub(crate) fn persist_activity<S>(store: &S, at: DateTime<Utc>) -> Result<(), SessionError>
where
    S: KeyValueStore + ?Sized,
{
    store.set(keys::LAST_ACTIVITY, &to_millis(at))
}

/// Removes every session key, token first. Keeps going past failures and
/// reports the first one.
pub(crate) fn clear<S>(store: &S) -> Result<(), SessionError>
where
    S: KeyValueStore + ?Sized,
{
    let mut first_error = None;
    for key in keys::ALL {
        if let Err(err) = store.remove(key) {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

pub(crate) fn parse_millis(key: &str, raw: &str) -> Result<DateTime<Utc>, SessionError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| SessionError::MalformedRecord(format!("{key} is not a timestamp: {raw:?}")))
}
