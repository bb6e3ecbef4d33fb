//! Member service
//!
//! Kick, leave, and member role assignment. Subscription revocation runs
//! before any of these acknowledge, so a removed member stops receiving
//! guild traffic the moment the call returns.

use chrono::Utc;
use tracing::{info, instrument};

use harbor_core::{
    DomainError, DomainEvent, EventRoute, Permissions, Snowflake,
};

use crate::dto::MemberResponse;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::permission::PermissionService;

/// Member service
pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    /// Create a new MemberService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Members of a guild
    #[instrument(skip(self))]
    pub async fn list_members(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<MemberResponse>> {
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::VIEW_CHANNEL)
            .await?;
        let members = self.ctx.member_repo().list_for_guild(guild_id).await?;
        Ok(members.into_iter().map(MemberResponse::from).collect())
    }

    /// Kick a member
    ///
    /// The target's live guild subscriptions are revoked before the kick
    /// acknowledges. The owner cannot be kicked.
    #[instrument(skip(self))]
    pub async fn kick_member(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        target_id: Snowflake,
    ) -> ServiceResult<()> {
        PermissionService::new(self.ctx)
            .require(guild_id, actor_id, Permissions::KICK_MEMBERS)
            .await?;

        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))?;
        if guild.is_owner(target_id) {
            return Err(DomainError::CannotKickOwner.into());
        }

        if self
            .ctx
            .member_repo()
            .find(guild_id, target_id)
            .await?
            .is_none()
        {
            return Err(DomainError::MemberNotFound.into());
        }

        // Revocation precedes the ack: nothing is delivered to the target
        // on these subscriptions afterwards
        self.ctx.event_sink().revoke_guild(target_id, guild_id).await;
        self.ctx.member_repo().delete(guild_id, target_id).await?;

        info!(%guild_id, %target_id, "member kicked");
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::MemberLeft {
                    guild_id,
                    user_id: target_id,
                    timestamp: Utc::now(),
                },
            )
            .await;
        Ok(())
    }

    /// Leave a guild
    ///
    /// The owner must transfer ownership first.
    #[instrument(skip(self))]
    pub async fn leave_guild(&self, guild_id: Snowflake, user_id: Snowflake) -> ServiceResult<()> {
        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))?;
        if guild.is_owner(user_id) {
            return Err(DomainError::CannotLeaveOwnedGuild.into());
        }

        if self
            .ctx
            .member_repo()
            .find(guild_id, user_id)
            .await?
            .is_none()
        {
            return Err(DomainError::MemberNotFound.into());
        }

        self.ctx.event_sink().revoke_guild(user_id, guild_id).await;
        self.ctx.member_repo().delete(guild_id, user_id).await?;

        info!(%guild_id, %user_id, "member left");
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::MemberLeft {
                    guild_id,
                    user_id,
                    timestamp: Utc::now(),
                },
            )
            .await;
        Ok(())
    }

    /// Grant a role to a member
    #[instrument(skip(self))]
    pub async fn assign_role(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        target_id: Snowflake,
        role_id: Snowflake,
    ) -> ServiceResult<MemberResponse> {
        PermissionService::new(self.ctx)
            .require(guild_id, actor_id, Permissions::MANAGE_ROLES)
            .await?;

        let role = self
            .ctx
            .role_repo()
            .find_by_id(role_id)
            .await?
            .filter(|r| r.guild_id == guild_id)
            .ok_or_else(|| ServiceError::not_found("Role", role_id.to_string()))?;

        let mut member = self
            .ctx
            .member_repo()
            .find(guild_id, target_id)
            .await?
            .ok_or(DomainError::MemberNotFound)?;
        member.add_role(role.id);
        self.ctx.member_repo().update(&member).await?;

        self.publish_role_change(guild_id, role_id).await;
        Ok(MemberResponse::from(member))
    }

    /// Take a role from a member
    ///
    /// The next permission check reflects the removal; if the member can no
    /// longer read the guild, their live subscriptions are revoked before
    /// this acknowledges.
    #[instrument(skip(self))]
    pub async fn remove_role(
        &self,
        guild_id: Snowflake,
        actor_id: Snowflake,
        target_id: Snowflake,
        role_id: Snowflake,
    ) -> ServiceResult<MemberResponse> {
        PermissionService::new(self.ctx)
            .require(guild_id, actor_id, Permissions::MANAGE_ROLES)
            .await?;

        let mut member = self
            .ctx
            .member_repo()
            .find(guild_id, target_id)
            .await?
            .ok_or(DomainError::MemberNotFound)?;
        member.remove_role(role_id);
        self.ctx.member_repo().update(&member).await?;

        self.revoke_if_unreadable(guild_id, target_id).await?;
        self.publish_role_change(guild_id, role_id).await;
        Ok(MemberResponse::from(member))
    }

    /// Revoke live guild subscriptions when the member lost read access
    pub(crate) async fn revoke_if_unreadable(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<()> {
        let permissions = PermissionService::new(self.ctx)
            .resolve(guild_id, user_id)
            .await?;
        if !permissions.has(Permissions::VIEW_CHANNEL) {
            self.ctx.event_sink().revoke_guild(user_id, guild_id).await;
        }
        Ok(())
    }

    async fn publish_role_change(&self, guild_id: Snowflake, role_id: Snowflake) {
        self.ctx
            .event_sink()
            .publish(
                EventRoute::Guild(guild_id),
                DomainEvent::RoleChanged {
                    guild_id,
                    role_id,
                    timestamp: Utc::now(),
                },
            )
            .await;
    }
}
