//! Channel service
//!
//! Guild channel CRUD and DM channel opening. Channel deletion drops every
//! live subscription to the channel before it acknowledges.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use harbor_core::{
    Channel, DomainEvent, EventRoute, Permissions, Snowflake,
};

use crate::dto::{ChannelResponse, CreateChannelRequest, UpdateChannelRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Channel service
pub struct ChannelService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChannelService<'a> {
    /// Create a new ChannelService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a text channel in a guild
    #[instrument(skip(self, request))]
    pub async fn create_channel(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        request: CreateChannelRequest,
    ) -> ServiceResult<ChannelResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_CHANNELS)
            .await?;

        let mut channel = Channel::new_text(self.ctx.next_id(), guild_id, request.name);
        channel.topic = request.topic;
        self.ctx.channel_repo().create(&channel).await?;

        info!(channel_id = %channel.id, %guild_id, "channel created");
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::ChannelCreated {
                    channel_id: channel.id,
                    guild_id,
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(ChannelResponse::from(channel))
    }

    /// Fetch a channel readable by the user
    #[instrument(skip(self))]
    pub async fn get_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<ChannelResponse> {
        let channel = self.find(channel_id).await?;
        if !PermissionService::new(self.ctx).can_view(&channel, user_id).await? {
            return Err(ServiceError::not_found("Channel", channel_id.to_string()));
        }
        Ok(ChannelResponse::from(channel))
    }

    /// Channels of a guild visible to the user
    #[instrument(skip(self))]
    pub async fn list_for_guild(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<ChannelResponse>> {
        let permissions = PermissionService::new(self.ctx).resolve(guild_id, user_id).await?;
        if !permissions.has(Permissions::VIEW_CHANNEL) {
            return Ok(Vec::new());
        }
        let channels = self.ctx.channel_repo().list_for_guild(guild_id).await?;
        Ok(channels.into_iter().map(ChannelResponse::from).collect())
    }

    /// Update a channel's name or topic
    #[instrument(skip(self, request))]
    pub async fn update_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
        request: UpdateChannelRequest,
    ) -> ServiceResult<ChannelResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let mut channel = self.find(channel_id).await?;
        let guild_id = channel
            .guild_id
            .ok_or_else(|| ServiceError::validation("DM channels cannot be edited"))?;
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_CHANNELS)
            .await?;

        channel.set_info(request.name, request.topic);
        self.ctx.channel_repo().update(&channel).await?;

        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::ChannelUpdated {
                    channel_id,
                    guild_id,
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(ChannelResponse::from(channel))
    }

    /// Delete a channel
    ///
    /// Every live subscription to the channel is dropped before this
    /// acknowledges; no event for the channel is delivered afterwards.
    #[instrument(skip(self))]
    pub async fn delete_channel(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<()> {
        let channel = self.find(channel_id).await?;
        let guild_id = channel
            .guild_id
            .ok_or_else(|| ServiceError::validation("DM channels cannot be deleted"))?;
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_CHANNELS)
            .await?;

        let lock = self.ctx.channel_lock(channel_id);
        let guard = lock.lock().await;
        self.ctx.channel_repo().delete(channel_id).await?;
        self.ctx.event_sink().drop_channel(channel_id).await;
        drop(guard);
        self.ctx.release_channel_lock(channel_id);

        info!(%channel_id, %guild_id, "channel deleted");
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::ChannelDeleted {
                    channel_id,
                    guild_id,
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(())
    }

    /// Open a DM channel with another user, reusing an existing one
    #[instrument(skip(self))]
    pub async fn open_dm(
        &self,
        user_id: Snowflake,
        recipient_id: Snowflake,
    ) -> ServiceResult<ChannelResponse> {
        if user_id == recipient_id {
            return Err(ServiceError::validation("cannot open a DM with yourself"));
        }
        self.ctx
            .user_repo()
            .find_by_id(recipient_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", recipient_id.to_string()))?;

        if let Some(existing) = self.ctx.channel_repo().find_dm(user_id, recipient_id).await? {
            return Ok(ChannelResponse::from(existing));
        }

        let channel = Channel::new_dm(self.ctx.next_id());
        self.ctx.channel_repo().create(&channel).await?;
        self.ctx
            .channel_repo()
            .add_dm_participants(channel.id, &[user_id, recipient_id])
            .await?;

        info!(channel_id = %channel.id, "dm channel opened");
        Ok(ChannelResponse::from(channel))
    }

    async fn find(&self, channel_id: Snowflake) -> ServiceResult<Channel> {
        self.ctx
            .channel_repo()
            .find_by_id(channel_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Channel", channel_id.to_string()))
    }
}
