use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use super::{Account, UserDirectory, UserRecord};
use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::validators::{ValidationError, validate_email, validate_phone};
use crate::{Role, SessionError};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    accounts: Vec<Account>,
}

/// Directory held in process memory. Clones share the same tables.
#[derive(Clone)]
pub struct InMemoryDirectory {
    tables: Arc<RwLock<Tables>>,
    hasher: Arc<dyn PasswordHasher>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::with_hasher(Argon2Hasher::default())
    }

    pub fn with_hasher(hasher: impl PasswordHasher + 'static) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            hasher: Arc::new(hasher),
        }
    }

    /// A directory pre-filled with the three demo employees.
    pub fn seeded() -> Self {
        Self::new().with_demo_users()
    }

    pub fn with_demo_users(self) -> Self {
        self.write().users = vec![
            UserRecord::new("E001", "Alice Johnson", "alice@example.com", "1234567890"),
            UserRecord::new("E002", "Bob Smith", "bob@example.com", "2345678901"),
            UserRecord::new("E003", "Charlie Brown", "charlie@example.com", "3456789012"),
        ];
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn add_user(&self, user: UserRecord) -> Result<UserRecord, SessionError> {
        let user = user.trimmed();
        user.validate()?;

        let mut tables = self.write();
        if tables.users.iter().any(|existing| existing.id == user.id) {
            return Err(SessionError::UserAlreadyExists);
        }
        tables.users.push(user.clone());
        drop(tables);

        log::info!(target: "vigil::directory", "msg=\"user added\" id=\"{}\"", user.id);
        Ok(user)
    }

    async fn update_contact(
        &self,
        id: &str,
        email: &str,
        phone: &str,
    ) -> Result<UserRecord, SessionError> {
        validate_email(email)?;
        validate_phone(phone)?;

        let mut tables = self.write();
        let user = tables
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(SessionError::UserNotFound)?;
        email.trim().clone_into(&mut user.email);
        phone.trim().clone_into(&mut user.phone);
        let updated = user.clone();
        drop(tables);

        log::info!(target: "vigil::directory", "msg=\"user updated\" id=\"{}\"", id);
        Ok(updated)
    }

    async fn delete_user(&self, id: &str) -> Result<(), SessionError> {
        let mut tables = self.write();
        let len_before = tables.users.len();
        tables.users.retain(|user| user.id != id);
        if tables.users.len() == len_before {
            return Err(SessionError::UserNotFound);
        }
        drop(tables);

        log::info!(target: "vigil::directory", "msg=\"user deleted\" id=\"{}\"", id);
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>, SessionError> {
        Ok(self.read().users.iter().find(|user| user.id == id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, SessionError> {
        Ok(self.read().users.clone())
    }

    async fn search(&self, query: &str) -> Result<Vec<UserRecord>, SessionError> {
        Ok(self
            .read()
            .users
            .iter()
            .filter(|user| user.matches(query))
            .cloned()
            .collect())
    }

    async fn add_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Account, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::UsernameEmpty.into());
        }
        if password.is_empty() {
            return Err(ValidationError::PasswordEmpty.into());
        }

        let account = Account {
            username: username.to_owned(),
            password_hash: self.hasher.hash(password)?,
            role,
        };

        let mut tables = self.write();
        if tables.accounts.iter().any(|existing| existing.username == username) {
            return Err(SessionError::UserAlreadyExists);
        }
        tables.accounts.push(account.clone());
        drop(tables);

        log::info!(
            target: "vigil::directory",
            "msg=\"account added\" username=\"{}\" role={}",
            username,
            role
        );
        Ok(account)
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>, SessionError> {
        Ok(self
            .read()
            .accounts
            .iter()
            .find(|account| account.username == username)
            .cloned())
    }
}
