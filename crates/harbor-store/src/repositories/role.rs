//! In-process implementation of RoleRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{DomainError, RepoResult, Role, RoleRepository, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemRoleRepository {
    tables: Arc<Tables>,
}

impl MemRoleRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl RoleRepository for MemRoleRepository {
    async fn create(&self, role: &Role) -> RepoResult<()> {
        self.tables.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Role>> {
        Ok(self.tables.roles.get(&id).map(|r| r.clone()))
    }

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Role>> {
        let mut roles: Vec<Role> = self
            .tables
            .roles
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .map(|r| r.clone())
            .collect();
        roles.sort_by_key(|r| (r.position, r.id));
        Ok(roles)
    }

    async fn find_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<Role>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.tables.roles.get(id).map(|r| r.clone()))
            .collect())
    }

    async fn update(&self, role: &Role) -> RepoResult<()> {
        match self.tables.roles.get_mut(&role.id) {
            Some(mut existing) => {
                *existing = role.clone();
                Ok(())
            }
            None => Err(DomainError::RoleNotFound(role.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.tables.roles.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use harbor_core::Permissions;

    #[tokio::test]
    async fn test_find_many_skips_deleted() {
        let repo = MemoryStore::new().roles();
        let a = Role::new(Snowflake::new(1), Snowflake::new(9), "mod".to_string(), Permissions::MANAGE_MESSAGES);
        let b = Role::default_member(Snowflake::new(2), Snowflake::new(9));
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();
        repo.delete(Snowflake::new(1)).await.unwrap();

        let found = repo.find_many(&[Snowflake::new(1), Snowflake::new(2)]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, Snowflake::new(2));
    }

    #[tokio::test]
    async fn test_list_orders_by_position() {
        let repo = MemoryStore::new().roles();
        let mut a = Role::new(Snowflake::new(1), Snowflake::new(9), "a".to_string(), Permissions::empty());
        a.set_position(2);
        let mut b = Role::new(Snowflake::new(2), Snowflake::new(9), "b".to_string(), Permissions::empty());
        b.set_position(1);
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        let roles = repo.list_for_guild(Snowflake::new(9)).await.unwrap();
        assert_eq!(roles[0].id, Snowflake::new(2));
    }
}
