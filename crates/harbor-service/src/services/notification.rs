//! Notification service
//!
//! Appends durable push entries; the dispatcher in `crate::dispatch`
//! drains them. Entries are never deleted by this layer.

use serde_json::json;
use tracing::instrument;

use harbor_core::{Message, PushQueueEntry, Snowflake};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Notification service
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    /// Create a new NotificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Enqueue an arbitrary payload for a user
    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        user_id: Snowflake,
        payload: serde_json::Value,
    ) -> ServiceResult<()> {
        let entry = PushQueueEntry::new(self.ctx.next_id(), user_id, payload);
        self.ctx.push_repo().enqueue(&entry).await?;
        Ok(())
    }

    /// Enqueue a new-message notification
    pub async fn notify_message(
        &self,
        recipient: Snowflake,
        message: &Message,
    ) -> ServiceResult<()> {
        self.enqueue(
            recipient,
            json!({
                "type": "message",
                "channel_id": message.channel_id.to_string(),
                "message_id": message.id.to_string(),
                "author_id": message.author_id.to_string(),
            }),
        )
        .await
    }

    /// The user's notification log, oldest first
    pub async fn list_for_user(
        &self,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<PushQueueEntry>> {
        Ok(self.ctx.push_repo().list_for_user(user_id).await?)
    }
}
