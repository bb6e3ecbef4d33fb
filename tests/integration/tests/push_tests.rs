//! Push queue delivery
//!
//! The queue is append-only and delivery is at-least-once: entries are
//! marked delivered only after the transport accepts, transient failures
//! back off and retry, and fatal rejections dead-letter the entry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use harbor_common::PushConfig;
use harbor_core::{PushRepository, Snowflake};
use harbor_service::{DispatchError, NotificationService, PushDispatcher, PushTransport};
use integration_tests::{register_and_login, service_env};

fn instant_retry_config() -> PushConfig {
    PushConfig {
        tick_secs: 1,
        batch_size: 100,
        base_backoff_secs: 0,
        max_backoff_secs: 60,
        delivery_timeout_secs: 5,
    }
}

/// Transport that fails a set number of times, then accepts
struct FlakyTransport {
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyTransport {
    fn new(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushTransport for FlakyTransport {
    async fn deliver(
        &self,
        _user_id: Snowflake,
        _payload: &serde_json::Value,
    ) -> Result<(), DispatchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DispatchError::Retryable("connection reset".to_string()));
        }
        Ok(())
    }
}

/// Transport rejecting every payload permanently
struct RejectingTransport;

#[async_trait]
impl PushTransport for RejectingTransport {
    async fn deliver(
        &self,
        _user_id: Snowflake,
        _payload: &serde_json::Value,
    ) -> Result<(), DispatchError> {
        Err(DispatchError::Fatal("unknown recipient".to_string()))
    }
}

#[tokio::test]
async fn test_enqueued_notification_is_delivered() {
    let (ctx, store) = service_env();
    let user = register_and_login(&ctx).await;

    NotificationService::new(&ctx)
        .enqueue(user.user.id, serde_json::json!({"type": "ping"}))
        .await
        .unwrap();

    let transport = Arc::new(FlakyTransport::new(0));
    let dispatcher = PushDispatcher::new(
        Arc::new(store.push()),
        transport.clone(),
        instant_retry_config(),
    );
    dispatcher.run_tick().await.unwrap();

    assert_eq!(transport.attempts(), 1);
    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].delivered);
    assert!(!entries[0].dead);

    // Delivered entries leave the selection set for good
    dispatcher.run_tick().await.unwrap();
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test]
async fn test_transient_failure_retries_until_accepted() {
    let (ctx, store) = service_env();
    let user = register_and_login(&ctx).await;

    NotificationService::new(&ctx)
        .enqueue(user.user.id, serde_json::json!({"type": "ping"}))
        .await
        .unwrap();

    // Fails once, then accepts; zero base backoff makes the retry
    // immediately due
    let transport = Arc::new(FlakyTransport::new(1));
    let dispatcher = PushDispatcher::new(
        Arc::new(store.push()),
        transport.clone(),
        instant_retry_config(),
    );

    dispatcher.run_tick().await.unwrap();
    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    assert!(!entries[0].delivered);
    assert_eq!(entries[0].attempts, 1);

    dispatcher.run_tick().await.unwrap();
    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    assert!(entries[0].delivered);
    assert_eq!(transport.attempts(), 2);
}

#[tokio::test]
async fn test_fatal_rejection_dead_letters() {
    let (ctx, store) = service_env();
    let user = register_and_login(&ctx).await;

    NotificationService::new(&ctx)
        .enqueue(user.user.id, serde_json::json!({"type": "ping"}))
        .await
        .unwrap();

    let dispatcher = PushDispatcher::new(
        Arc::new(store.push()),
        Arc::new(RejectingTransport),
        instant_retry_config(),
    );
    dispatcher.run_tick().await.unwrap();

    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    assert!(entries[0].dead);
    assert!(!entries[0].delivered);

    // Dead entries are never selected again
    dispatcher.run_tick().await.unwrap();
    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    assert_eq!(entries[0].attempts, 0);
}

#[tokio::test]
async fn test_entries_wait_for_their_backoff() {
    let (ctx, store) = service_env();
    let user = register_and_login(&ctx).await;

    NotificationService::new(&ctx)
        .enqueue(user.user.id, serde_json::json!({"type": "ping"}))
        .await
        .unwrap();

    let entries = NotificationService::new(&ctx)
        .list_for_user(user.user.id)
        .await
        .unwrap();
    store
        .push()
        .record_attempt(entries[0].id, Utc::now() + Duration::minutes(10))
        .await
        .unwrap();

    let transport = Arc::new(FlakyTransport::new(0));
    let dispatcher = PushDispatcher::new(
        Arc::new(store.push()),
        transport.clone(),
        instant_retry_config(),
    );
    dispatcher.run_tick().await.unwrap();

    // Not due yet, so the transport never saw it
    assert_eq!(transport.attempts(), 0);
}
