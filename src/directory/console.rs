use super::{UserDirectory, UserRecord};
use crate::{KeyValueStore, Role, SessionError, SessionManager};

/// User management for administrators.
///
/// Every call first requires a live `ADMIN` session on `manager`.
pub struct AdminConsole<S: KeyValueStore + 'static, D: UserDirectory> {
    manager: SessionManager<S>,
    directory: D,
}

impl<S: KeyValueStore + 'static, D: UserDirectory> AdminConsole<S, D> {
    pub fn new(manager: SessionManager<S>, directory: D) -> Self {
        AdminConsole { manager, directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub async fn add_user(&self, user: UserRecord) -> Result<UserRecord, SessionError> {
        let admin = self.authorize()?;
        let added = self.directory.add_user(user).await?;
        log::info!(
            target: "vigil::directory",
            "msg=\"admin added user\" admin=\"{}\" id=\"{}\"",
            admin,
            added.id
        );
        Ok(added)
    }

    pub async fn update_contact(
        &self,
        id: &str,
        email: &str,
        phone: &str,
    ) -> Result<UserRecord, SessionError> {
        self.authorize()?;
        self.directory.update_contact(id, email, phone).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), SessionError> {
        let admin = self.authorize()?;
        self.directory.delete_user(id).await?;
        log::info!(
            target: "vigil::directory",
            "msg=\"admin deleted user\" admin=\"{}\" id=\"{}\"",
            admin,
            id
        );
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, SessionError> {
        self.authorize()?;
        self.directory.list_users().await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UserRecord>, SessionError> {
        self.authorize()?;
        self.directory.search(query).await
    }

    fn authorize(&self) -> Result<String, SessionError> {
        if !self.manager.enforce_expiry() {
            return Err(SessionError::NotAuthenticated);
        }
        let session = self.manager.session().ok_or(SessionError::NotAuthenticated)?;
        if session.role != Role::Admin {
            return Err(SessionError::Forbidden);
        }
        Ok(session.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionConfig;
    use crate::crypto::Argon2Hasher;
    use crate::directory::InMemoryDirectory;
    use crate::store::{MemoryStorage, MemoryStore};

    fn console() -> AdminConsole<MemoryStore, InMemoryDirectory> {
        let manager = SessionManager::new(MemoryStorage::new().tab(), SessionConfig::default());
        let directory = InMemoryDirectory::with_hasher(Argon2Hasher::fast()).with_demo_users();
        AdminConsole::new(manager, directory)
    }

    #[tokio::test]
    async fn test_requires_session() {
        let console = console();
        assert!(matches!(
            console.list_users().await,
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_requires_admin_role() {
        let console = console();
        console.manager.login("alice", "tok");

        assert!(matches!(
            console.delete_user("E001").await,
            Err(SessionError::Forbidden)
        ));
        assert_eq!(console.directory().list_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_admin_manages_users() {
        let console = console();
        console.manager.login_with_role("bob", "tok", Role::Admin);

        console
            .add_user(UserRecord::new("E004", "Dana Scully", "dana@example.com", "4567890123"))
            .await
            .unwrap();
        console
            .update_contact("E004", "dana@fbi.gov", "4567890000")
            .await
            .unwrap();
        console.delete_user("E001").await.unwrap();

        let users = console.search("dana").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "dana@fbi.gov");
        assert_eq!(console.list_users().await.unwrap().len(), 3);
    }
}
