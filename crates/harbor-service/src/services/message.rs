//! Message service
//!
//! Send, edit, delete, and page messages. Every channel-routed mutation
//! commits and publishes under the channel's publish lock, so subscribers
//! observe one channel's events in commit order.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use harbor_core::{
    Channel, DomainEvent, DomainError, EventRoute, Message, MessageQuery, Permissions, Snowflake,
};

use crate::dto::{CreateMessageRequest, EditMessageRequest, MessageResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::notification::NotificationService;
use super::permission::PermissionService;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a message to a channel
    #[instrument(skip(self, request))]
    pub async fn send_message(
        &self,
        channel_id: Snowflake,
        author_id: Snowflake,
        request: CreateMessageRequest,
    ) -> ServiceResult<MessageResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let channel = self.find_channel(channel_id).await?;
        PermissionService::new(self.ctx)
            .require_channel(&channel, author_id, Permissions::SEND_MESSAGES)
            .await?;

        let mut message = Message::new(
            self.ctx.next_id(),
            channel_id,
            author_id,
            Some(request.content),
        );
        if let Some(raw) = request.reply_to {
            let reference = Snowflake::parse(&raw)
                .map_err(|_| ServiceError::validation("invalid reply_to id"))?;
            self.validate_reply(&message, reference).await?;
            message = message.with_reply_to(reference);
        }

        // Commit and publish under the channel lock: subscribers see this
        // channel's events in commit order
        let lock = self.ctx.channel_lock(channel_id);
        let _guard = lock.lock().await;
        self.ctx.message_repo().create(&message).await?;
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Channel(channel_id),
                DomainEvent::MessageCreated {
                    message_id: message.id,
                    channel_id,
                    author_id,
                    content: message.content.clone(),
                    reply_to: message.reply_to,
                    timestamp: message.created_at,
                },
            )
            .await;
        drop(_guard);

        info!(message_id = %message.id, %channel_id, "message sent");

        // DM recipients also get a durable notification
        if channel.guild_id.is_none() {
            let participants = self.ctx.channel_repo().dm_participants(channel_id).await?;
            let notifications = NotificationService::new(self.ctx);
            for recipient in participants.into_iter().filter(|p| *p != author_id) {
                notifications.notify_message(recipient, &message).await?;
            }
        }

        Ok(MessageResponse::from(message))
    }

    /// Edit a message; author only
    #[instrument(skip(self, request))]
    pub async fn edit_message(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        request: EditMessageRequest,
    ) -> ServiceResult<MessageResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let mut message = self.find_message(message_id).await?;
        if message.author_id != user_id {
            return Err(DomainError::NotMessageAuthor.into());
        }

        message.edit(Some(request.content));

        let lock = self.ctx.channel_lock(message.channel_id);
        let _guard = lock.lock().await;
        self.ctx.message_repo().update(&message).await?;
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Channel(message.channel_id),
                DomainEvent::MessageUpdated {
                    message_id,
                    channel_id: message.channel_id,
                    content: message.content.clone(),
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(MessageResponse::from(message))
    }

    /// Delete a message; the author or a moderator
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<()> {
        let message = self.find_message(message_id).await?;
        let channel = self.find_channel(message.channel_id).await?;

        if message.author_id != user_id {
            PermissionService::new(self.ctx)
                .require_channel(&channel, user_id, Permissions::MANAGE_MESSAGES)
                .await?;
        }

        let lock = self.ctx.channel_lock(message.channel_id);
        let _guard = lock.lock().await;
        self.ctx.message_repo().delete(message_id).await?;
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Channel(message.channel_id),
                DomainEvent::MessageDeleted {
                    message_id,
                    channel_id: message.channel_id,
                    timestamp: Utc::now(),
                },
            )
            .await;

        info!(%message_id, "message deleted");
        Ok(())
    }

    /// Page a channel's history, newest first
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
        query: MessageQuery,
    ) -> ServiceResult<Vec<MessageResponse>> {
        let channel = self.find_channel(channel_id).await?;
        PermissionService::new(self.ctx)
            .require_channel(&channel, user_id, Permissions::VIEW_CHANNEL)
            .await?;

        let messages = self
            .ctx
            .message_repo()
            .list_for_channel(channel_id, query)
            .await?;
        Ok(messages.into_iter().map(MessageResponse::from).collect())
    }

    async fn validate_reply(&self, message: &Message, reference: Snowflake) -> ServiceResult<()> {
        let target = self.find_message(reference).await.map_err(|_| {
            ServiceError::from(DomainError::InvalidReplyReference)
        })?;
        // Same channel, strictly earlier ID: reference chains cannot cycle
        if target.channel_id != message.channel_id || !reference.earlier_than(message.id) {
            return Err(DomainError::InvalidReplyReference.into());
        }
        Ok(())
    }

    async fn find_channel(&self, channel_id: Snowflake) -> ServiceResult<Channel> {
        self.ctx
            .channel_repo()
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Channel", channel_id.to_string()))
    }

    async fn find_message(&self, message_id: Snowflake) -> ServiceResult<Message> {
        self.ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message", message_id.to_string()))
    }
}
