//! Guild service

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use harbor_core::{DomainEvent, Guild, GuildMember, Role, Snowflake};

use crate::dto::{CreateGuildRequest, GuildResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Guild service
pub struct GuildService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GuildService<'a> {
    /// Create a new GuildService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a guild
    ///
    /// Seeds the default "member" role and enrolls the owner carrying it.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_guild(
        &self,
        owner_id: Snowflake,
        request: CreateGuildRequest,
    ) -> ServiceResult<GuildResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let mut guild = Guild::new(self.ctx.next_id(), request.name, owner_id);
        guild.description = request.description;
        self.ctx.guild_repo().create(&guild).await?;

        let default_role = Role::default_member(self.ctx.next_id(), guild.id);
        self.ctx.role_repo().create(&default_role).await?;

        let mut owner_member = GuildMember::new(guild.id, owner_id);
        owner_member.add_role(default_role.id);
        self.ctx.member_repo().create(&owner_member).await?;

        info!(guild_id = %guild.id, %owner_id, "guild created");
        self.ctx
            .event_sink()
            .publish(
                harbor_core::EventRoute::Guild(guild.id),
                DomainEvent::MemberJoined {
                    guild_id: guild.id,
                    user_id: owner_id,
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(GuildResponse::from(guild))
    }

    /// Fetch a guild the user is a member of
    #[instrument(skip(self))]
    pub async fn get_guild(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<GuildResponse> {
        let guild = self
            .ctx
            .guild_repo()
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guild", guild_id.to_string()))?;

        if !guild.is_owner(user_id)
            && self
                .ctx
                .member_repo()
                .find(guild_id, user_id)
                .await?
                .is_none()
        {
            return Err(ServiceError::not_found("Guild", guild_id.to_string()));
        }

        Ok(GuildResponse::from(guild))
    }

    /// Guilds the user belongs to
    pub async fn list_for_user(&self, user_id: Snowflake) -> ServiceResult<Vec<GuildResponse>> {
        let guilds = self.ctx.guild_repo().list_for_user(user_id).await?;
        Ok(guilds.into_iter().map(GuildResponse::from).collect())
    }

    /// The guild's seeded default role
    pub(crate) async fn default_role(&self, guild_id: Snowflake) -> ServiceResult<Option<Role>> {
        let roles = self.ctx.role_repo().list_for_guild(guild_id).await?;
        Ok(roles.into_iter().find(|r| r.name == "member"))
    }
}
