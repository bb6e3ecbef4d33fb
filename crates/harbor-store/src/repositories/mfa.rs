//! In-process implementation of MfaRepository

use std::sync::Arc;

use async_trait::async_trait;

use harbor_core::{MfaRepository, MfaState, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemMfaRepository {
    tables: Arc<Tables>,
}

impl MemMfaRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl MfaRepository for MemMfaRepository {
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Option<MfaState>> {
        Ok(self.tables.mfa.get(&user_id).map(|s| s.clone()))
    }

    async fn upsert(&self, state: &MfaState) -> RepoResult<()> {
        self.tables.mfa.insert(state.user_id, state.clone());
        Ok(())
    }

    async fn consume_backup_code(&self, user_id: Snowflake, hash: &str) -> RepoResult<bool> {
        // The pinned entry serializes concurrent consumption of one hash
        match self.tables.mfa.get_mut(&user_id) {
            Some(mut state) => Ok(state.consume_backup_code(hash)),
            None => Ok(false),
        }
    }

    async fn disable(&self, user_id: Snowflake) -> RepoResult<()> {
        self.tables.mfa.remove(&user_id);
        Ok(())
    }
}
