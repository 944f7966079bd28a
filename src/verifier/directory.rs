use async_trait::async_trait;

use super::{CredentialVerifier, Verification};
use crate::crypto::{Argon2Hasher, DEFAULT_TOKEN_LENGTH, PasswordHasher, generate_token};
use crate::directory::UserDirectory;
use crate::{SecretString, SessionError, SessionToken};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Verifies against the accounts of a [`UserDirectory`].
///
/// Unknown usernames and wrong passwords get the same answer.
pub struct DirectoryVerifier<D: UserDirectory> {
    directory: D,
    hasher: Argon2Hasher,
}

impl<D: UserDirectory> DirectoryVerifier<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            hasher: Argon2Hasher::default(),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }
}

#[async_trait]
impl<D: UserDirectory> CredentialVerifier for DirectoryVerifier<D> {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "verifier.directory", skip_all, fields(username = %username))
    )]
    async fn verify_credentials(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Verification, SessionError> {
        let Some(account) = self.directory.find_account(username).await? else {
            log::debug!(
                target: "vigil::verifier",
                "msg=\"unknown account\" username=\"{}\"",
                username
            );
            return Ok(Verification::rejected(INVALID_CREDENTIALS));
        };

        let matches = match self
            .hasher
            .verify(password.expose_secret(), &account.password_hash)
        {
            Ok(matches) => matches,
            Err(err) => {
                log::error!(
                    target: "vigil::verifier",
                    "msg=\"stored password hash unreadable\" username=\"{}\" error=\"{}\"",
                    username,
                    err
                );
                false
            }
        };
        if !matches {
            return Ok(Verification::rejected(INVALID_CREDENTIALS));
        }

        Ok(Verification::accepted(
            SessionToken::new(generate_token(DEFAULT_TOKEN_LENGTH)),
            Some(account.role),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use crate::directory::InMemoryDirectory;

    async fn verifier() -> DirectoryVerifier<InMemoryDirectory> {
        let directory = InMemoryDirectory::with_hasher(Argon2Hasher::fast());
        directory
            .add_account("alice", "wonderland", Role::Admin)
            .await
            .unwrap();
        DirectoryVerifier::new(directory)
    }

    #[tokio::test]
    async fn test_accepts_correct_password() {
        let verifier = verifier().await;

        let verification = verifier
            .verify_credentials("alice", &SecretString::new("wonderland"))
            .await
            .unwrap();

        let Verification::Accepted { token, role, .. } = verification else {
            panic!("expected acceptance");
        };
        assert_eq!(token.expose_secret().len(), DEFAULT_TOKEN_LENGTH);
        assert_eq!(role, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_alike() {
        let verifier = verifier().await;

        let wrong = verifier
            .verify_credentials("alice", &SecretString::new("looking-glass"))
            .await
            .unwrap();
        let unknown = verifier
            .verify_credentials("mallory", &SecretString::new("wonderland"))
            .await
            .unwrap();

        assert_eq!(wrong, Verification::rejected(INVALID_CREDENTIALS));
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let verifier = verifier().await;
        let password = SecretString::new("wonderland");

        let first = verifier.verify_credentials("alice", &password).await.unwrap();
        let second = verifier.verify_credentials("alice", &password).await.unwrap();

        assert_ne!(first, second);
    }
}
