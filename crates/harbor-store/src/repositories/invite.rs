//! In-process implementation of InviteRepository
//!
//! Redemption pins the invite's map entry for the whole check-increment-join
//! sequence, which serializes concurrent redemptions of one code. A SQL
//! store would express the same thing as a conditional
//! `UPDATE ... SET uses = uses + 1 WHERE uses < max_uses RETURNING` inside
//! the membership transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use harbor_core::{
    DomainError, GuildMember, Invite, InviteRepository, RedeemOutcome, RepoResult, Snowflake,
};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemInviteRepository {
    tables: Arc<Tables>,
}

impl MemInviteRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl InviteRepository for MemInviteRepository {
    async fn create(&self, invite: &Invite) -> RepoResult<()> {
        match self.tables.invites.entry(invite.code.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DomainError::InviteCodeExists),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(invite.clone());
                Ok(())
            }
        }
    }

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Invite>> {
        Ok(self.tables.invites.get(code).map(|i| i.clone()))
    }

    async fn list_for_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Invite>> {
        let mut invites: Vec<Invite> = self
            .tables
            .invites
            .iter()
            .filter(|i| i.guild_id == guild_id)
            .map(|i| i.clone())
            .collect();
        invites.sort_by_key(|i| i.created_at);
        Ok(invites)
    }

    #[instrument(skip(self, member), fields(user_id = %member.user_id))]
    async fn redeem(
        &self,
        code: &str,
        member: &GuildMember,
        now: DateTime<Utc>,
    ) -> RepoResult<RedeemOutcome> {
        let mut invite = self
            .tables
            .invites
            .get_mut(code)
            .ok_or_else(|| DomainError::InviteNotFound(code.to_string()))?;

        // Existing members do not consume a use
        if let Some(existing) = self.tables.members.get(&(member.guild_id, member.user_id)) {
            return Ok(RedeemOutcome::AlreadyMember(existing.clone()));
        }

        if invite.is_expired_at(now) {
            return Ok(RedeemOutcome::Expired);
        }
        if invite.is_exhausted() {
            return Ok(RedeemOutcome::Exhausted);
        }

        invite.uses += 1;
        self.tables
            .members
            .insert((member.guild_id, member.user_id), member.clone());
        Ok(RedeemOutcome::Redeemed(invite.clone()))
    }

    async fn delete(&self, code: &str) -> RepoResult<()> {
        self.tables.invites.remove(code);
        Ok(())
    }
}
