//! In-process implementation of GuildRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{DomainError, Guild, GuildRepository, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemGuildRepository {
    tables: Arc<Tables>,
}

impl MemGuildRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl GuildRepository for MemGuildRepository {
    async fn create(&self, guild: &Guild) -> RepoResult<()> {
        self.tables.guilds.insert(guild.id, guild.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>> {
        Ok(self.tables.guilds.get(&id).map(|g| g.clone()))
    }

    async fn update(&self, guild: &Guild) -> RepoResult<()> {
        match self.tables.guilds.get_mut(&guild.id) {
            Some(mut existing) => {
                *existing = guild.clone();
                Ok(())
            }
            None => Err(DomainError::GuildNotFound(guild.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.tables.guilds.remove(&id);
        self.tables.roles.retain(|_, role| role.guild_id != id);
        self.tables.members.retain(|(guild_id, _), _| *guild_id != id);
        self.tables.invites.retain(|_, invite| invite.guild_id != id);
        Ok(())
    }

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Guild>> {
        let mut guilds: Vec<Guild> = self
            .tables
            .members
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .filter_map(|entry| self.tables.guilds.get(&entry.key().0).map(|g| g.clone()))
            .collect();
        guilds.sort_by_key(|g| g.id);
        Ok(guilds)
    }
}
