//! In-process implementation of MemberRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{DomainError, GuildMember, MemberRepository, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemMemberRepository {
    tables: Arc<Tables>,
}

impl MemMemberRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl MemberRepository for MemMemberRepository {
    async fn create(&self, member: &GuildMember) -> RepoResult<()> {
        let key = (member.guild_id, member.user_id);
        if self.tables.members.contains_key(&key) {
            return Err(DomainError::AlreadyMember);
        }
        self.tables.members.insert(key, member.clone());
        Ok(())
    }

    async fn find(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>> {
        Ok(self.tables.members.get(&(guild_id, user_id)).map(|m| m.clone()))
    }

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<GuildMember>> {
        let mut members: Vec<GuildMember> = self
            .tables
            .members
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| entry.value().clone())
            .collect();
        members.sort_by_key(|m| m.user_id);
        Ok(members)
    }

    async fn update(&self, member: &GuildMember) -> RepoResult<()> {
        match self.tables.members.get_mut(&(member.guild_id, member.user_id)) {
            Some(mut existing) => {
                *existing = member.clone();
                Ok(())
            }
            None => Err(DomainError::MemberNotFound),
        }
    }

    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<()> {
        self.tables.members.remove(&(guild_id, user_id));
        Ok(())
    }

    async fn remove_role_from_all(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<u64> {
        let mut touched = 0;
        for mut entry in self.tables.members.iter_mut() {
            if entry.key().0 == guild_id && entry.role_ids.contains(&role_id) {
                entry.remove_role(role_id);
                touched += 1;
            }
        }
        Ok(touched)
    }
}
