use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{CredentialVerifier, Verification};
use crate::{SecretString, SessionError, SessionToken};

const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Demo verifier that accepts any non-empty username and password.
///
/// Issues `mock_token_<millis>` tokens after a simulated round trip and
/// caches the last one as the bearer token.
#[derive(Debug)]
pub struct StubVerifier {
    delay: Duration,
    bearer: Mutex<Option<SessionToken>>,
}

impl StubVerifier {
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            bearer: Mutex::new(None),
        }
    }

    /// The token most recently issued and not yet cleared.
    pub fn bearer(&self) -> Option<SessionToken> {
        self.bearer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for StubVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialVerifier for StubVerifier {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Verification, SessionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if username.is_empty() || password.is_empty() {
            return Ok(Verification::rejected("Username and password are required"));
        }

        let token = SessionToken::new(format!("mock_token_{}", Utc::now().timestamp_millis()));
        *self.bearer.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());

        Ok(Verification::Accepted {
            token,
            role: None,
            message: Some("Login successful".to_owned()),
        })
    }

    fn clear_bearer(&self) {
        self.bearer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_any_non_empty_credentials() {
        let verifier = StubVerifier::with_delay(Duration::ZERO);

        let verification = verifier
            .verify_credentials("alice", &SecretString::new("anything"))
            .await
            .unwrap();

        let Verification::Accepted { token, role, .. } = verification else {
            panic!("expected acceptance");
        };
        assert!(token.expose_secret().starts_with("mock_token_"));
        assert_eq!(role, None);
        assert_eq!(verifier.bearer(), Some(token));
    }

    #[tokio::test]
    async fn test_rejects_empty_fields() {
        let verifier = StubVerifier::with_delay(Duration::ZERO);

        let verification = verifier
            .verify_credentials("", &SecretString::new("pw"))
            .await
            .unwrap();

        assert_eq!(
            verification,
            Verification::rejected("Username and password are required")
        );
        assert_eq!(verifier.bearer(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_delay() {
        let verifier = StubVerifier::new();
        let started = tokio::time::Instant::now();

        verifier
            .verify_credentials("alice", &SecretString::new("pw"))
            .await
            .unwrap();

        assert!(started.elapsed() >= DEFAULT_DELAY);
    }

    #[tokio::test]
    async fn test_clear_bearer() {
        let verifier = StubVerifier::with_delay(Duration::ZERO);
        verifier
            .verify_credentials("alice", &SecretString::new("pw"))
            .await
            .unwrap();

        verifier.clear_bearer();
        assert_eq!(verifier.bearer(), None);
    }
}
