//! Permission resolver
//!
//! Effective permissions are computed on demand by OR-folding the member's
//! role masks; nothing is cached, so a role change is visible to the next
//! check. The guild owner bypasses role resolution entirely.

use tracing::{debug, instrument};

use harbor_core::{Channel, ChannelType, Permissions, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Permission service for access control
pub struct PermissionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PermissionService<'a> {
    /// Create a new PermissionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Effective permissions of a user in a guild
    ///
    /// Owner resolves to every bit. A member with no roles resolves to the
    /// empty mask. A non-member is an error.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Permissions> {
        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))?;

        if guild.is_owner(user_id) {
            debug!(%user_id, %guild_id, "owner, granting all permissions");
            return Ok(Permissions::ALL);
        }

        let member = self
            .ctx
            .member_repo()
            .find(guild_id, user_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found("Member", format!("{guild_id}/{user_id}"))
            })?;

        let roles = self.ctx.role_repo().find_many(&member.role_ids).await?;
        let permissions = Permissions::combine(roles.iter().map(|r| r.permissions));

        debug!(%user_id, %guild_id, permissions = %permissions.bits(), "resolved member permissions");
        Ok(permissions)
    }

    /// Check one permission in a guild
    pub async fn check(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        permission: Permissions,
    ) -> ServiceResult<bool> {
        Ok(self.resolve(guild_id, user_id).await?.has(permission))
    }

    /// Require a permission in a guild; side-effect free on denial
    #[instrument(skip(self))]
    pub async fn require(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        permission: Permissions,
    ) -> ServiceResult<()> {
        if !self.check(guild_id, user_id, permission).await? {
            return Err(ServiceError::permission_denied(permission.list().join(", ")));
        }
        Ok(())
    }

    /// Require a permission against a channel
    ///
    /// Guild channels resolve through the guild. DM channels grant their
    /// participants everything and everyone else nothing.
    #[instrument(skip(self))]
    pub async fn require_channel(
        &self,
        channel: &Channel,
        user_id: Snowflake,
        permission: Permissions,
    ) -> ServiceResult<()> {
        match channel.guild_id {
            Some(guild_id) => self.require(guild_id, user_id, permission).await,
            None => {
                let participants = self.ctx.channel_repo().dm_participants(channel.id).await?;
                if participants.contains(&user_id) {
                    Ok(())
                } else {
                    Err(ServiceError::permission_denied(permission.list().join(", ")))
                }
            }
        }
    }

    /// Whether the user can currently read the channel
    pub async fn can_view(&self, channel: &Channel, user_id: Snowflake) -> ServiceResult<bool> {
        match channel.guild_id {
            Some(guild_id) => match self.resolve(guild_id, user_id).await {
                Ok(permissions) => Ok(permissions.has(Permissions::VIEW_CHANNEL)),
                Err(ServiceError::NotFound { .. }) => Ok(false),
                Err(e) => Err(e),
            },
            None => {
                let participants = self.ctx.channel_repo().dm_participants(channel.id).await?;
                Ok(participants.contains(&user_id))
            }
        }
    }

    /// All channels the user may subscribe to, each with its guild scope
    ///
    /// Used by the gateway to seed a connection's subscription set. DM
    /// channels carry no guild.
    #[instrument(skip(self))]
    pub async fn visible_channels(
        &self,
        user_id: Snowflake,
    ) -> ServiceResult<(Vec<Snowflake>, Vec<(Snowflake, Option<Snowflake>)>)> {
        let mut guild_ids = Vec::new();
        let mut channels = Vec::new();

        for guild in self.ctx.guild_repo().list_for_user(user_id).await? {
            let permissions = self.resolve(guild.id, user_id).await?;
            if !permissions.has(Permissions::VIEW_CHANNEL) {
                continue;
            }
            guild_ids.push(guild.id);
            for channel in self.ctx.channel_repo().list_for_guild(guild.id).await? {
                if channel.channel_type == ChannelType::Text {
                    channels.push((channel.id, Some(guild.id)));
                }
            }
        }

        for dm in self.ctx.channel_repo().list_dms_for_user(user_id).await? {
            channels.push((dm.id, None));
        }

        Ok((guild_ids, channels))
    }
}
