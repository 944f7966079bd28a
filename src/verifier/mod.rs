//! Credential verification.
//!
//! The session manager trusts whatever identity it is given; deciding
//! whether a username and password are good is the job of a
//! [`CredentialVerifier`].

mod directory;
mod stub;

pub use directory::DirectoryVerifier;
pub use stub::StubVerifier;

use async_trait::async_trait;

use crate::{Role, SecretString, SessionError, SessionToken};

/// Answer of a verifier that could be reached.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Accepted {
        token: SessionToken,
        /// `None` means the verifier does not assign roles.
        role: Option<Role>,
        message: Option<String>,
    },
    Rejected {
        message: Option<String>,
    },
}

impl Verification {
    pub fn accepted(token: impl Into<SessionToken>, role: Option<Role>) -> Self {
        Verification::Accepted {
            token: token.into(),
            role,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Verification::Rejected {
            message: Some(message.into()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verification::Accepted { .. })
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Checks `username` and `password`.
    ///
    /// A wrong password is `Ok(Verification::Rejected)`. `Err` is reserved
    /// for failing to reach the verifier at all, reported as
    /// [`SessionError::Transport`].
    async fn verify_credentials(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Verification, SessionError>;

    /// Forgets any bearer token cached for outgoing requests.
    fn clear_bearer(&self) {}
}
