//! Employee directory and login accounts.
//!
//! [`UserDirectory`] is the storage seam; [`InMemoryDirectory`] is the
//! bundled implementation. [`AdminConsole`] puts the directory behind a
//! live `ADMIN` session.

mod console;
mod memory;

pub use console::AdminConsole;
pub use memory::InMemoryDirectory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::validators::{validate_email, validate_id, validate_name, validate_phone};
use crate::{Role, SessionError};

/// An employee as listed in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl UserRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Checks every field; the first failure is returned.
    pub fn validate(&self) -> Result<(), SessionError> {
        validate_id(&self.id)?;
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        Ok(())
    }

    /// Case-insensitive substring match on id or name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        self.id.to_lowercase().contains(&query) || self.name.to_lowercase().contains(&query)
    }

    fn trimmed(&self) -> Self {
        Self::new(
            self.id.trim(),
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
        )
    }
}

/// Credentials a user signs in with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fails with [`SessionError::UserAlreadyExists`] for a duplicate id.
    async fn add_user(&self, user: UserRecord) -> Result<UserRecord, SessionError>;

    /// Changes email and phone; id and name are fixed once created.
    async fn update_contact(
        &self,
        id: &str,
        email: &str,
        phone: &str,
    ) -> Result<UserRecord, SessionError>;

    async fn delete_user(&self, id: &str) -> Result<(), SessionError>;

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, SessionError>;

    /// All users in insertion order.
    async fn list_users(&self) -> Result<Vec<UserRecord>, SessionError>;

    /// Users whose id or name contains `query`, ignoring case. An empty
    /// query matches everyone.
    async fn search(&self, query: &str) -> Result<Vec<UserRecord>, SessionError>;

    /// Stores a login account, hashing `password`.
    async fn add_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, SessionError>;

    async fn find_account(&self, username: &str) -> Result<Option<Account>, SessionError>;
}
