//! Invite service
//!
//! Creation requires the `CREATE_INVITES` bit. Redemption is delegated to
//! the store as one indivisible operation: the use count can never pass
//! `max_uses`, and an existing member redeeming again changes nothing.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use harbor_core::{
    generate_invite_code, DomainError, DomainEvent, EventRoute, GuildMember, Invite, Permissions,
    RedeemOutcome, Snowflake,
};

use crate::dto::{CreateInviteRequest, InviteResponse, MemberResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::guild::GuildService;
use super::permission::PermissionService;

/// Invite service
pub struct InviteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InviteService<'a> {
    /// Create a new InviteService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create an invite for a guild
    #[instrument(skip(self, request))]
    pub async fn create_invite(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        request: CreateInviteRequest,
    ) -> ServiceResult<InviteResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::CREATE_INVITES)
            .await?;

        // Retry on the unlikely code collision
        for _ in 0..5 {
            let mut invite = Invite::new(generate_invite_code(), guild_id, user_id);
            if let Some(max_uses) = request.max_uses {
                invite = invite.with_max_uses(max_uses);
            }
            if let Some(max_age) = request.max_age {
                invite = invite.with_max_age(max_age);
            }

            match self.ctx.invite_repo().create(&invite).await {
                Ok(()) => {
                    info!(code = %invite.code, %guild_id, "invite created");
                    return Ok(InviteResponse::from(invite));
                }
                Err(DomainError::InviteCodeExists) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::internal("could not allocate an invite code"))
    }

    /// Look up an invite; expired and exhausted codes read as absent
    #[instrument(skip(self))]
    pub async fn get_invite(&self, code: &str) -> ServiceResult<InviteResponse> {
        let invite = self
            .ctx
            .invite_repo()
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invite", code.to_string()))?;

        if invite.is_expired_at(Utc::now()) || invite.is_exhausted() {
            return Err(ServiceError::not_found("Invite", code.to_string()));
        }
        Ok(InviteResponse::from(invite))
    }

    /// Invites of a guild
    pub async fn list_for_guild(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<InviteResponse>> {
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_GUILD)
            .await?;
        let invites = self.ctx.invite_repo().list_for_guild(guild_id).await?;
        Ok(invites.into_iter().map(InviteResponse::from).collect())
    }

    /// Redeem an invite
    ///
    /// Atomic in the store: validity check, use increment, and membership
    /// creation commit or fail together. Redeeming as an existing member
    /// returns the current membership without consuming a use.
    #[instrument(skip(self))]
    pub async fn redeem_invite(
        &self,
        code: &str,
        user_id: Snowflake,
    ) -> ServiceResult<MemberResponse> {
        let invite = self
            .ctx
            .invite_repo()
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::InviteNotFound(code.to_string()))?;

        let mut member = GuildMember::new(invite.guild_id, user_id);
        if let Some(default_role) = GuildService::new(self.ctx).default_role(invite.guild_id).await? {
            member.add_role(default_role.id);
        }

        let outcome = self
            .ctx
            .invite_repo()
            .redeem(code, &member, Utc::now())
            .await?;

        match outcome {
            RedeemOutcome::Redeemed(invite) => {
                info!(code = %invite.code, guild_id = %invite.guild_id, %user_id, "invite redeemed");
                self.ctx
                    .event_sink()
                    .publish(
                        EventRoute::Guild(invite.guild_id),
                        DomainEvent::MemberJoined {
                            guild_id: invite.guild_id,
                            user_id,
                            timestamp: Utc::now(),
                        },
                    )
                    .await;
                Ok(MemberResponse::from(member))
            }
            RedeemOutcome::AlreadyMember(existing) => Ok(MemberResponse::from(existing)),
            RedeemOutcome::Expired => Err(DomainError::InviteExpired.into()),
            RedeemOutcome::Exhausted => Err(DomainError::InviteExhausted.into()),
        }
    }

    /// Delete an invite
    #[instrument(skip(self))]
    pub async fn delete_invite(&self, code: &str, user_id: Snowflake) -> ServiceResult<()> {
        let invite = self
            .ctx
            .invite_repo()
            .find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invite", code.to_string()))?;

        PermissionService::new(self.ctx)
            .require(invite.guild_id, user_id, Permissions::MANAGE_GUILD)
            .await?;
        self.ctx.invite_repo().delete(code).await?;
        Ok(())
    }
}
