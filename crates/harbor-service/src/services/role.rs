//! Role service
//!
//! Role CRUD. Permission edits take effect on the next check (nothing is
//! cached); when an edit or deletion costs members their read access,
//! their live subscriptions are revoked before the call acknowledges.

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use harbor_core::{
    DomainEvent, EventRoute, Permissions, Role, Snowflake,
};

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::member::MemberService;
use super::permission::PermissionService;

/// Role service
pub struct RoleService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RoleService<'a> {
    /// Create a new RoleService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a role
    #[instrument(skip(self, request))]
    pub async fn create_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        request: CreateRoleRequest,
    ) -> ServiceResult<RoleResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_ROLES)
            .await?;

        let permissions = parse_permissions(request.permissions.as_deref())?;
        let role = Role::new(self.ctx.next_id(), guild_id, request.name, permissions);
        self.ctx.role_repo().create(&role).await?;

        info!(role_id = %role.id, %guild_id, "role created");
        self.publish_role_change(guild_id, role.id).await;
        Ok(RoleResponse::from(role))
    }

    /// Roles of a guild, by position
    pub async fn list_roles(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<RoleResponse>> {
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::VIEW_CHANNEL)
            .await?;
        let roles = self.ctx.role_repo().list_for_guild(guild_id).await?;
        Ok(roles.into_iter().map(RoleResponse::from).collect())
    }

    /// Update a role's name, permissions, or position
    ///
    /// A permission edit is visible to the next resolution; carriers who
    /// lose read access have their subscriptions revoked before the ack.
    #[instrument(skip(self, request))]
    pub async fn update_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        user_id: Snowflake,
        request: UpdateRoleRequest,
    ) -> ServiceResult<RoleResponse> {
        request
            .validate()
            .map_err(|e| ServiceError::validation(e.to_string()))?;
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_ROLES)
            .await?;

        let mut role = self.find_role(guild_id, role_id).await?;
        if let Some(name) = request.name {
            role.name = name;
        }
        if let Some(position) = request.position {
            role.set_position(position);
        }
        let permissions_changed = if let Some(raw) = request.permissions.as_deref() {
            let permissions = parse_permissions(Some(raw))?;
            let changed = permissions != role.permissions;
            role.set_permissions(permissions);
            changed
        } else {
            false
        };
        self.ctx.role_repo().update(&role).await?;

        if permissions_changed {
            self.revoke_unreadable_carriers(guild_id, role_id).await?;
        }
        self.publish_role_change(guild_id, role_id).await;
        Ok(RoleResponse::from(role))
    }

    /// Delete a role, dropping it from every member that carries it
    #[instrument(skip(self))]
    pub async fn delete_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        user_id: Snowflake,
    ) -> ServiceResult<()> {
        PermissionService::new(self.ctx)
            .require(guild_id, user_id, Permissions::MANAGE_ROLES)
            .await?;
        self.find_role(guild_id, role_id).await?;

        let carriers: Vec<Snowflake> = self
            .ctx
            .member_repo()
            .list_for_guild(guild_id)
            .await?
            .into_iter()
            .filter(|m| m.role_ids.contains(&role_id))
            .map(|m| m.user_id)
            .collect();

        self.ctx
            .member_repo()
            .remove_role_from_all(guild_id, role_id)
            .await?;
        self.ctx.role_repo().delete(role_id).await?;

        let members = MemberService::new(self.ctx);
        for carrier in carriers {
            members.revoke_if_unreadable(guild_id, carrier).await?;
        }

        info!(%role_id, %guild_id, "role deleted");
        self.publish_role_change(guild_id, role_id).await;
        Ok(())
    }

    async fn revoke_unreadable_carriers(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> ServiceResult<()> {
        let members = MemberService::new(self.ctx);
        for member in self.ctx.member_repo().list_for_guild(guild_id).await? {
            if member.role_ids.contains(&role_id) {
                members.revoke_if_unreadable(guild_id, member.user_id).await?;
            }
        }
        Ok(())
    }

    async fn find_role(&self, guild_id: Snowflake, role_id: Snowflake) -> ServiceResult<Role> {
        self.ctx
            .role_repo()
            .find_by_id(role_id)
            .await?
            .filter(|r| r.guild_id == guild_id)
            .ok_or_else(|| ServiceError::not_found("Role", role_id.to_string()))
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

fn parse_permissions(raw: Option<&str>) -> ServiceResult<Permissions> {
    match raw {
        None => Ok(Permissions::empty()),
        Some(raw) => {
            let bits: u64 = raw
                .parse()
                .map_err(|_| ServiceError::validation("invalid permission bits"))?;
            Ok(Permissions::from_bits_truncate(bits))
        }
    }
}
