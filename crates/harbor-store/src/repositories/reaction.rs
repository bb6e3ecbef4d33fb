//! In-process implementation of ReactionRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{Reaction, ReactionRepository, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemReactionRepository {
    tables: Arc<Tables>,
}

impl MemReactionRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl ReactionRepository for MemReactionRepository {
    async fn add(&self, reaction: &Reaction) -> RepoResult<bool> {
        let key = (
            reaction.message_id,
            reaction.user_id,
            reaction.emoji.clone(),
        );
        match self.tables.reactions.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(reaction.clone());
                Ok(true)
            }
        }
    }

    async fn remove(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> RepoResult<bool> {
        Ok(self
            .tables
            .reactions
            .remove(&(message_id, user_id, emoji.to_string()))
            .is_some())
    }

    async fn list_for_message(&self, message_id: Snowflake) -> RepoResult<Vec<Reaction>> {
        let mut reactions: Vec<Reaction> = self
            .tables
            .reactions
            .iter()
            .filter(|entry| entry.key().0 == message_id)
            .map(|entry| entry.value().clone())
            .collect();
        reactions.sort_by_key(|r| r.created_at);
        Ok(reactions)
    }

    async fn delete_for_message(&self, message_id: Snowflake) -> RepoResult<()> {
        self.tables
            .reactions
            .retain(|(id, _, _), _| *id != message_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_add_is_idempotent_per_triple() {
        let repo = MemoryStore::new().reactions();
        let reaction = Reaction::new(Snowflake::new(1), Snowflake::new(2), "👍".to_string());

        assert!(repo.add(&reaction).await.unwrap());
        assert!(!repo.add(&reaction).await.unwrap());

        // Same user, different emoji is a distinct reaction
        let other = Reaction::new(Snowflake::new(1), Snowflake::new(2), "🎉".to_string());
        assert!(repo.add(&other).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_reports_presence() {
        let repo = MemoryStore::new().reactions();
        let reaction = Reaction::new(Snowflake::new(1), Snowflake::new(2), "👍".to_string());
        repo.add(&reaction).await.unwrap();

        assert!(repo.remove(Snowflake::new(1), Snowflake::new(2), "👍").await.unwrap());
        assert!(!repo.remove(Snowflake::new(1), Snowflake::new(2), "👍").await.unwrap());
    }
}
