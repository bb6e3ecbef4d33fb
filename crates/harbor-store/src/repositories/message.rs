//! In-process implementation of MessageRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{
    DomainError, Message, MessageQuery, MessageRepository, RepoResult, Snowflake,
};

use crate::store::Tables;

const MAX_PAGE: u16 = 100;
const DEFAULT_PAGE: u16 = 50;

#[derive(Clone)]
pub struct MemMessageRepository {
    tables: Arc<Tables>,
}

impl MemMessageRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl MessageRepository for MemMessageRepository {
    async fn create(&self, message: &Message) -> RepoResult<()> {
        self.tables.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        Ok(self.tables.messages.get(&id).map(|m| m.clone()))
    }

    async fn list_for_channel(
        &self,
        channel_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = usize::from(query.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE));

        let mut messages: Vec<Message> = self
            .tables
            .messages
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .filter(|m| query.before.is_none_or(|b| m.id < b))
            .filter(|m| query.after.is_none_or(|a| m.id > a))
            .map(|m| m.clone())
            .collect();

        // Newest first; snowflake order is creation order
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn update(&self, message: &Message) -> RepoResult<()> {
        match self.tables.messages.get_mut(&message.id) {
            Some(mut existing) => {
                *existing = message.clone();
                Ok(())
            }
            None => Err(DomainError::MessageNotFound(message.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.tables.messages.remove(&id);
        self.tables.reactions.retain(|(message_id, _, _), _| *message_id != id);
        // Replies to the deleted message lose the reference, not the message
        self.tables.messages.alter_all(|_, mut message| {
            if message.reply_to == Some(id) {
                message.reply_to = None;
            }
            message
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seed(repo: &MemMessageRepository, channel: i64, ids: &[i64]) {
        for id in ids {
            let message = Message::new(
                Snowflake::new(*id),
                Snowflake::new(channel),
                Snowflake::new(1),
                Some(format!("m{id}")),
            );
            repo.create(&message).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_with_cursor() {
        let repo = MemoryStore::new().messages();
        seed(&repo, 5, &[10, 20, 30, 40]).await;
        seed(&repo, 6, &[15]).await;

        let page = repo
            .list_for_channel(Snowflake::new(5), MessageQuery::default())
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().map(|m| m.id.into_inner()).collect();
        assert_eq!(ids, vec![40, 30, 20, 10]);

        let page = repo
            .list_for_channel(
                Snowflake::new(5),
                MessageQuery { before: Some(Snowflake::new(30)), after: None, limit: Some(1) },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, Snowflake::new(20));
    }

    #[tokio::test]
    async fn test_delete_nulls_reply_references() {
        let repo = MemoryStore::new().messages();
        seed(&repo, 5, &[10]).await;

        let reply = Message::new(
            Snowflake::new(20),
            Snowflake::new(5),
            Snowflake::new(1),
            Some("replying".to_string()),
        )
        .with_reply_to(Snowflake::new(10));
        repo.create(&reply).await.unwrap();

        repo.delete(Snowflake::new(10)).await.unwrap();

        let orphan = repo.find_by_id(Snowflake::new(20)).await.unwrap().unwrap();
        assert_eq!(orphan.reply_to, None, "reference must be nulled, not cascaded");
    }

    #[tokio::test]
    async fn test_limit_is_clamped() {
        let repo = MemoryStore::new().messages();
        seed(&repo, 5, &(1..=150).collect::<Vec<_>>()).await;

        let page = repo
            .list_for_channel(
                Snowflake::new(5),
                MessageQuery { before: None, after: None, limit: Some(u16::MAX) },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), usize::from(MAX_PAGE));
    }
}
