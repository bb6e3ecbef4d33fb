//! In-process implementation of SessionRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use harbor_core::{RepoResult, Session, SessionRepository, Snowflake};

use crate::store::Tables;

#[derive(Clone)]
pub struct MemSessionRepository {
    tables: Arc<Tables>,
}

impl MemSessionRepository {
    pub(crate) fn new(tables: Arc<Tables>) -> Self {
        Self { tables }
    }
}

#[async_trait]
impl SessionRepository for MemSessionRepository {
    async fn create(&self, session: &Session) -> RepoResult<()> {
        self.tables
            .session_tokens
            .insert(session.token_hash.clone(), session.id);
        self.tables.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> RepoResult<Option<Session>> {
        let Some(id) = self.tables.session_tokens.get(token_hash).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.tables.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Session>> {
        Ok(self.tables.sessions.get(&id).map(|s| s.clone()))
    }

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .tables
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.clone())
            .collect();
        sessions.sort_by_key(|s| s.id);
        Ok(sessions)
    }

    async fn touch(&self, id: Snowflake, at: DateTime<Utc>) -> RepoResult<()> {
        if let Some(mut session) = self.tables.sessions.get_mut(&id) {
            session.touch(at);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke(&self, id: Snowflake) -> RepoResult<()> {
        if let Some(mut session) = self.tables.sessions.get_mut(&id) {
            session.revoked = true;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_all_for_user(&self, user_id: Snowflake) -> RepoResult<u64> {
        let mut revoked = 0;
        for mut session in self.tables.sessions.iter_mut() {
            if session.user_id == user_id && !session.revoked {
                session.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    fn session(id: i64, user_id: i64, token_hash: &str) -> Session {
        Session::new(
            Snowflake::new(id),
            Snowflake::new(user_id),
            token_hash.to_string(),
            Utc::now() + Duration::days(30),
        )
    }

    #[tokio::test]
    async fn test_token_hash_lookup() {
        let repo = MemoryStore::new().sessions();
        repo.create(&session(1, 10, "abc123")).await.unwrap();

        let found = repo.find_by_token_hash("abc123").await.unwrap().unwrap();
        assert_eq!(found.id, Snowflake::new(1));
        assert!(repo.find_by_token_hash("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_is_monotonic() {
        let repo = MemoryStore::new().sessions();
        repo.create(&session(1, 10, "abc")).await.unwrap();

        let later = Utc::now() + Duration::minutes(5);
        repo.touch(Snowflake::new(1), later).await.unwrap();
        let seen = repo.find_by_id(Snowflake::new(1)).await.unwrap().unwrap().last_seen_at;
        assert_eq!(seen, later);

        // Out-of-order touch does not move last-seen backwards
        repo.touch(Snowflake::new(1), later - Duration::minutes(1)).await.unwrap();
        let seen2 = repo.find_by_id(Snowflake::new(1)).await.unwrap().unwrap().last_seen_at;
        assert_eq!(seen2, later);
    }

    #[tokio::test]
    async fn test_revoke_all_counts_once() {
        let repo = MemoryStore::new().sessions();
        repo.create(&session(1, 10, "a")).await.unwrap();
        repo.create(&session(2, 10, "b")).await.unwrap();
        repo.create(&session(3, 11, "c")).await.unwrap();

        assert_eq!(repo.revoke_all_for_user(Snowflake::new(10)).await.unwrap(), 2);
        assert_eq!(repo.revoke_all_for_user(Snowflake::new(10)).await.unwrap(), 0);
        assert!(!repo.find_by_id(Snowflake::new(3)).await.unwrap().unwrap().revoked);
    }
}
