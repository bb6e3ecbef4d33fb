//! In-process implementation of UserRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{DomainError, RepoResult, Snowflake, User, UserRepository};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemUserRepository {
    tables: Arc<Tables>,
}

impl MemUserRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl UserRepository for MemUserRepository {
    async fn create(&self, user: &User) -> RepoResult<()> {
        if let Some(email) = &user.email {
            let taken = self
                .tables
                .users
                .iter()
                .any(|u| u.email.as_deref() == Some(email.as_str()));
            if taken {
                return Err(DomainError::EmailAlreadyExists);
            }
        }
        let tag_taken = self.tables.users.iter().any(|u| {
            u.username == user.username && u.discriminator == user.discriminator
        });
        if tag_taken {
            return Err(DomainError::TagAlreadyExists);
        }

        self.tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<User>> {
        Ok(self.tables.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .map(|u| u.clone()))
    }

    async fn find_by_tag(&self, username: &str, discriminator: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.username == username && u.discriminator == discriminator)
            .map(|u| u.clone()))
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        match self.tables.users.get_mut(&user.id) {
            Some(mut existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(DomainError::UserNotFound(user.id)),
        }
    }

    async fn password_hash(&self, user_id: Snowflake) -> RepoResult<Option<String>> {
        Ok(self.tables.password_hashes.get(&user_id).map(|h| h.clone()))
    }

    async fn set_password_hash(&self, user_id: Snowflake, hash: &str) -> RepoResult<()> {
        if !self.tables.users.contains_key(&user_id) {
            return Err(DomainError::UserNotFound(user_id));
        }
        self.tables.password_hashes.insert(user_id, hash.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(id: i64, username: &str, email: &str) -> User {
        User::new(
            Snowflake::new(id),
            username.to_string(),
            "0001".to_string(),
            Some(email.to_string()),
        )
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = MemoryStore::new().users();
        repo.create(&user(1, "ada", "ada@example.com")).await.unwrap();

        assert!(repo.find_by_id(Snowflake::new(1)).await.unwrap().is_some());
        assert!(repo.find_by_email("ada@example.com").await.unwrap().is_some());
        assert!(repo.find_by_tag("ada", "0001").await.unwrap().is_some());
        assert!(repo.find_by_tag("ada", "0002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_and_tag() {
        let repo = MemoryStore::new().users();
        repo.create(&user(1, "ada", "ada@example.com")).await.unwrap();

        let err = repo.create(&user(2, "eve", "ada@example.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists));

        let err = repo.create(&user(3, "ada", "eve@example.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::TagAlreadyExists));
    }

    #[tokio::test]
    async fn test_password_hash_requires_user() {
        let repo = MemoryStore::new().users();
        let err = repo.set_password_hash(Snowflake::new(9), "$argon2...").await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound(_)));

        repo.create(&user(1, "ada", "ada@example.com")).await.unwrap();
        repo.set_password_hash(Snowflake::new(1), "$argon2...").await.unwrap();
        assert_eq!(
            repo.password_hash(Snowflake::new(1)).await.unwrap().as_deref(),
            Some("$argon2...")
        );
    }
}
