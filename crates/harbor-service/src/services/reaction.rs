//! Reaction service

use chrono::Utc;
use tracing::instrument;

use harbor_core::{
    Channel, DomainEvent, EventRoute, Message, Permissions, Reaction, Snowflake,
};

use crate::dto::ReactionResponse;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

const MAX_EMOJI_LEN: usize = 32;

/// Reaction service
pub struct ReactionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReactionService<'a> {
    /// Create a new ReactionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Add a reaction; idempotent per (message, user, emoji)
    #[instrument(skip(self))]
    pub async fn add_reaction(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> ServiceResult<()> {
        if emoji.is_empty() || emoji.len() > MAX_EMOJI_LEN {
            return Err(ServiceError::validation("invalid emoji"));
        }

        let message = self.find_message(message_id).await?;
        let channel = self.find_channel(message.channel_id).await?;
        PermissionService::new(self.ctx)
            .require_channel(&channel, user_id, Permissions::ADD_REACTIONS)
            .await?;

        let reaction = Reaction::new(message_id, user_id, emoji.to_string());

        let lock = self.ctx.channel_lock(message.channel_id);
        let _guard = lock.lock().await;
        let inserted = self.ctx.reaction_repo().add(&reaction).await?;
        if inserted {
            self.ctx
                .event_sink()
                .publish(
                    EventRoute::Channel(message.channel_id),
                    DomainEvent::ReactionAdded {
                        message_id,
                        channel_id: message.channel_id,
                        user_id,
                        emoji: emoji.to_string(),
                        timestamp: Utc::now(),
                    },
                )
                .await;
        }
        Ok(())
    }

    /// Remove the caller's own reaction
    #[instrument(skip(self))]
    pub async fn remove_reaction(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
        emoji: &str,
    ) -> ServiceResult<()> {
        let message = self.find_message(message_id).await?;

        let lock = self.ctx.channel_lock(message.channel_id);
        let _guard = lock.lock().await;
        let removed = self
            .ctx
            .reaction_repo()
            .remove(message_id, user_id, emoji)
            .await?;
        if removed {
            self.ctx
                .event_sink()
                .publish(
                    EventRoute::Channel(message.channel_id),
                    DomainEvent::ReactionRemoved {
                        message_id,
                        channel_id: message.channel_id,
                        user_id,
                        emoji: emoji.to_string(),
                        timestamp: Utc::now(),
                    },
                )
                .await;
        }
        Ok(())
    }

    /// Reactions on a message, oldest first
    pub async fn list_reactions(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<ReactionResponse>> {
        let message = self.find_message(message_id).await?;
        let channel = self.find_channel(message.channel_id).await?;
        PermissionService::new(self.ctx)
            .require_channel(&channel, user_id, Permissions::VIEW_CHANNEL)
            .await?;

        let reactions = self.ctx.reaction_repo().list_for_message(message_id).await?;
        Ok(reactions.into_iter().map(ReactionResponse::from).collect())
    }

    async fn find_message(&self, message_id: Snowflake) -> ServiceResult<Message> {
        self.ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message", message_id.to_string()))
    }

    async fn find_channel(&self, channel_id: Snowflake) -> ServiceResult<Channel> {
        self.ctx
            .channel_repo()
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Channel", channel_id.to_string()))
    }
}
