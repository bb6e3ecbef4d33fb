//! In-process implementation of ChannelRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{Channel, ChannelRepository, ChannelType, DomainError, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemChannelRepository {
    tables: Arc<Tables>,
}

impl MemChannelRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl ChannelRepository for MemChannelRepository {
    async fn create(&self, channel: &Channel) -> RepoResult<()> {
        self.tables.channels.insert(channel.id, channel.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Channel>> {
        Ok(self.tables.channels.get(&id).map(|c| c.clone()))
    }

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Channel>> {
        let mut channels: Vec<Channel> = self
            .tables
            .channels
            .iter()
            .filter(|c| c.guild_id == Some(guild_id))
            .map(|c| c.clone())
            .collect();
        channels.sort_by_key(|c| (c.position, c.id));
        Ok(channels)
    }

    async fn update(&self, channel: &Channel) -> RepoResult<()> {
        match self.tables.channels.get_mut(&channel.id) {
            Some(mut existing) => {
                *existing = channel.clone();
                Ok(())
            }
            None => Err(DomainError::ChannelNotFound(channel.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.tables.channels.remove(&id);
        self.tables.dm_participants.remove(&id);
        self.tables.messages.retain(|_, m| m.channel_id != id);
        Ok(())
    }

    async fn dm_participants(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        Ok(self
            .tables
            .dm_participants
            .get(&channel_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn find_dm(&self, a: Snowflake, b: Snowflake) -> RepoResult<Option<Channel>> {
        for entry in self.tables.dm_participants.iter() {
            let users = entry.value();
            if users.len() == 2 && users.contains(&a) && users.contains(&b) {
                return Ok(self.tables.channels.get(entry.key()).map(|c| c.clone()));
            }
        }
        Ok(None)
    }

    async fn list_dms_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Channel>> {
        let mut channels: Vec<Channel> = self
            .tables
            .dm_participants
            .iter()
            .filter(|entry| entry.value().contains(&user_id))
            .filter_map(|entry| self.tables.channels.get(entry.key()).map(|c| c.clone()))
            .collect();
        channels.sort_by_key(|c| c.id);
        Ok(channels)
    }

    async fn add_dm_participants(
        &self,
        channel_id: Snowflake,
        users: &[Snowflake],
    ) -> RepoResult<()> {
        let channel = self
            .tables
            .channels
            .get(&channel_id)
            .ok_or(DomainError::ChannelNotFound(channel_id))?;
        if channel.channel_type != ChannelType::Dm {
            return Err(DomainError::ValidationError(
                "participants only apply to DM channels".to_string(),
            ));
        }
        drop(channel);

        let mut entry = self.tables.dm_participants.entry(channel_id).or_default();
        for user in users {
            if !entry.contains(user) {
                entry.push(*user);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use harbor_core::MessageRepository;

    #[tokio::test]
    async fn test_dm_lookup_by_pair() {
        let repo = MemoryStore::new().channels();
        repo.create(&Channel::new_dm(Snowflake::new(5))).await.unwrap();
        repo.add_dm_participants(Snowflake::new(5), &[Snowflake::new(1), Snowflake::new(2)])
            .await
            .unwrap();

        let found = repo.find_dm(Snowflake::new(2), Snowflake::new(1)).await.unwrap();
        assert_eq!(found.unwrap().id, Snowflake::new(5));
        assert!(repo.find_dm(Snowflake::new(1), Snowflake::new(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_participants_rejected_on_guild_channel() {
        let repo = MemoryStore::new().channels();
        repo.create(&Channel::new_text(Snowflake::new(5), Snowflake::new(9), "general".to_string()))
            .await
            .unwrap();

        let err = repo
            .add_dm_participants(Snowflake::new(5), &[Snowflake::new(1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_delete_drops_messages() {
        let store = MemoryStore::new();
        let repo = store.channels();
        repo.create(&Channel::new_text(Snowflake::new(5), Snowflake::new(9), "general".to_string()))
            .await
            .unwrap();
        let message = harbor_core::Message::new(
            Snowflake::new(100),
            Snowflake::new(5),
            Snowflake::new(1),
            Some("hi".to_string()),
        );
        store.messages().create(&message).await.unwrap();

        repo.delete(Snowflake::new(5)).await.unwrap();
        assert!(store.messages().find_by_id(Snowflake::new(100)).await.unwrap().is_none());
    }
}
