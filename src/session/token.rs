use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::hash_token;

/// Opaque bearer token issued by the credential verifier.
///
/// Never parsed. `Debug` and `Display` are redacted; use
/// [`fingerprint`](Self::fingerprint) to correlate tokens in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First 12 hex characters of the token's SHA-256.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut digest = hash_token(&self.0);
        digest.truncate(12);
        digest
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({})", self.fingerprint())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Serialize for SessionToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SessionToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_shows_fingerprint_only() {
        let token = SessionToken::new("mock_token_1700000000000");
        let debug = format!("{token:?}");

        assert!(!debug.contains("mock_token"));
        assert_eq!(debug, format!("SessionToken({})", token.fingerprint()));
        assert_eq!(format!("{token}"), "[REDACTED]");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = SessionToken::new("tokA");
        assert_eq!(a.fingerprint().len(), 12);
        assert_eq!(a.fingerprint(), SessionToken::from("tokA").fingerprint());
        assert_ne!(a.fingerprint(), SessionToken::from("tokB").fingerprint());
    }
}
