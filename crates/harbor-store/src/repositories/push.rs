//! In-process implementation of PushRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use harbor_core::{DomainError, PushQueueEntry, PushRepository, RepoResult, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemPushRepository {
    tables: Arc<Tables>,
}

impl MemPushRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl PushRepository for MemPushRepository {
    async fn enqueue(&self, entry: &PushQueueEntry) -> RepoResult<()> {
        self.tables.push_entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn select_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepoResult<Vec<PushQueueEntry>> {
        let mut due: Vec<PushQueueEntry> = self
            .tables
            .push_entries
            .iter()
            .filter(|e| e.is_due(now))
            .map(|e| e.clone())
            .collect();
        due.sort_by_key(|e| e.id);
        due.truncate(limit);
        Ok(due)
    }

    #[instrument(skip(self))]
    async fn mark_delivered(&self, id: Snowflake) -> RepoResult<bool> {
        // Pinned entry makes the false->true transition observable exactly once
        let mut entry = self
            .tables
            .push_entries
            .get_mut(&id)
            .ok_or(DomainError::InternalError(format!("unknown push entry {id}")))?;
        if entry.delivered {
            return Ok(false);
        }
        entry.delivered = true;
        Ok(true)
    }

    async fn record_attempt(
        &self,
        id: Snowflake,
        next_attempt_at: DateTime<Utc>,
    ) -> RepoResult<()> {
        if let Some(mut entry) = self.tables.push_entries.get_mut(&id) {
            entry.attempts += 1;
            entry.next_attempt_at = next_attempt_at;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_dead(&self, id: Snowflake) -> RepoResult<()> {
        if let Some(mut entry) = self.tables.push_entries.get_mut(&id) {
            entry.dead = true;
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<PushQueueEntry>> {
        let mut entries: Vec<PushQueueEntry> = self
            .tables
            .push_entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.clone())
            .collect();
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }
}
