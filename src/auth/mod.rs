//! Authentication facade: verify credentials, then start a session.

use serde::Deserialize;

use crate::events::SessionEvent;
use crate::verifier::{CredentialVerifier, Verification};
use crate::{KeyValueStore, Role, SecretString, Session, SessionError, SessionManager};

const MISSING_FIELDS: &str = "Please enter both username and password";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const LOGIN_FAILED: &str = "Login failed";

/// Login form input.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Trimmed username and password, or `None` if either ends up empty.
    fn normalized(&self) -> Option<(String, SecretString)> {
        let username = self.username.trim();
        let password = self.password.trimmed();
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some((username.to_owned(), password))
    }
}

/// Result of a login attempt, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// The verifier answered and said no.
    Rejected { message: String },
    /// The verifier could not be reached.
    Unavailable { message: String },
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoginOutcome::Success => None,
            LoginOutcome::Rejected { message } | LoginOutcome::Unavailable { message } => {
                Some(message)
            }
        }
    }
}

/// Pairs a [`SessionManager`] with the [`CredentialVerifier`] that vouches
/// for new sessions.
pub struct Authenticator<S: KeyValueStore + 'static, V: CredentialVerifier> {
    manager: SessionManager<S>,
    verifier: V,
}

impl<S: KeyValueStore + 'static, V: CredentialVerifier> Authenticator<S, V> {
    pub fn new(manager: SessionManager<S>, verifier: V) -> Self {
        Authenticator { manager, verifier }
    }

    pub fn manager(&self) -> &SessionManager<S> {
        &self.manager
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Verifies `credentials` and, on success, starts a session.
    ///
    /// Nothing changes on rejection or when the verifier is unreachable.
    /// Verifiers that do not assign roles yield a `USER` session.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "auth.login", skip_all, fields(username = %credentials.username.trim()))
    )]
    pub async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        let Some((username, password)) = credentials.normalized() else {
            return self.reject(credentials.username.trim(), MISSING_FIELDS.to_owned());
        };

        match self.verifier.verify_credentials(&username, &password).await {
            Ok(Verification::Accepted { token, role, .. }) if !token.is_empty() => {
                let role = role.unwrap_or_default();
                self.manager.login_with_role(username, token, role);
                LoginOutcome::Success
            }
            Ok(Verification::Accepted { .. }) => {
                log::warn!(
                    target: "vigil::auth",
                    "msg=\"verifier accepted without a token\" username=\"{}\"",
                    username
                );
                self.reject(&username, INVALID_CREDENTIALS.to_owned())
            }
            Ok(Verification::Rejected { message }) => {
                let message = message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| INVALID_CREDENTIALS.to_owned());
                self.reject(&username, message)
            }
            Err(err) => {
                log::error!(
                    target: "vigil::auth",
                    "msg=\"verifier unavailable\" username=\"{}\" error=\"{}\"",
                    username,
                    err
                );
                let message = match err {
                    SessionError::Transport(message) if !message.is_empty() => message,
                    _ => LOGIN_FAILED.to_owned(),
                };
                LoginOutcome::Unavailable { message }
            }
        }
    }

    /// Ends the session and drops the verifier's cached bearer token.
    pub fn logout(&self) {
        self.manager.logout();
        self.verifier.clear_bearer();
    }

    pub fn refresh_session(&self) {
        self.manager.refresh_session();
    }

    /// Checks expiry first; see [`SessionManager::enforce_expiry`].
    pub fn is_authenticated(&self) -> bool {
        self.manager.enforce_expiry()
    }

    /// The current session, if it is still live.
    pub fn session(&self) -> Option<Session> {
        if self.manager.enforce_expiry() {
            self.manager.session()
        } else {
            None
        }
    }

    /// Gate for sensitive operations.
    pub fn ensure_authenticated(&self) -> Result<Session, SessionError> {
        self.session().ok_or(SessionError::NotAuthenticated)
    }

    pub fn ensure_role(&self, role: Role) -> Result<Session, SessionError> {
        let session = self.ensure_authenticated()?;
        if session.role != role {
            log::warn!(
                target: "vigil::auth",
                "msg=\"role check failed\" username=\"{}\" required={} actual={}",
                session.username,
                role,
                session.role
            );
            return Err(SessionError::Forbidden);
        }
        Ok(session)
    }

    fn reject(&self, username: &str, message: String) -> LoginOutcome {
        log::info!(
            target: "vigil::auth",
            "msg=\"login rejected\" username=\"{}\" reason=\"{}\"",
            username,
            message
        );
        self.manager.dispatch(&SessionEvent::LoginRejected {
            username: username.to_owned(),
            reason: message.clone(),
            at: self.manager.now(),
        });
        LoginOutcome::Rejected { message }
    }
}
