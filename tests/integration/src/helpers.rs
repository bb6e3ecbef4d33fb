//! Environment builders and flow helpers

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use harbor_core::{EventSink, NullEventSink, Snowflake};
use harbor_gateway::connection::{Connection, ConnectionManager};
use harbor_gateway::fanout::FanoutDispatcher;
use harbor_gateway::protocol::{CloseCode, GatewayMessage};
use harbor_service::dto::{CreateChannelRequest, CreateGuildRequest, LoginResponse};
use harbor_service::{AuthService, ChannelService, GuildService, ServiceContext};
use harbor_store::MemoryStore;

/// A full stack over one in-memory store
pub struct TestEnv {
    pub services: ServiceContext,
    pub store: MemoryStore,
    pub manager: Arc<ConnectionManager>,
}

/// Stack with the real gateway fan-out dispatcher as the event sink
pub fn gateway_env() -> TestEnv {
    let store = MemoryStore::new();
    let manager = ConnectionManager::new_shared();
    let dispatcher = FanoutDispatcher::start(manager.clone());
    let services = build_context(&store, dispatcher, Duration::days(30));
    TestEnv {
        services,
        store,
        manager,
    }
}

/// Stack with a no-op event sink, for flows that don't observe fan-out
pub fn service_env() -> (ServiceContext, MemoryStore) {
    let store = MemoryStore::new();
    let services = build_context(&store, Arc::new(NullEventSink), Duration::days(30));
    (services, store)
}

/// Like [`service_env`] but with a custom session lifetime
pub fn service_env_with_ttl(ttl: Duration) -> (ServiceContext, MemoryStore) {
    let store = MemoryStore::new();
    let services = build_context(&store, Arc::new(NullEventSink), ttl);
    (services, store)
}

fn build_context(store: &MemoryStore, sink: Arc<dyn EventSink>, ttl: Duration) -> ServiceContext {
    ServiceContext::builder()
        .user_repo(Arc::new(store.users()))
        .session_repo(Arc::new(store.sessions()))
        .mfa_repo(Arc::new(store.mfa()))
        .guild_repo(Arc::new(store.guilds()))
        .role_repo(Arc::new(store.roles()))
        .member_repo(Arc::new(store.members()))
        .channel_repo(Arc::new(store.channels()))
        .message_repo(Arc::new(store.messages()))
        .reaction_repo(Arc::new(store.reactions()))
        .invite_repo(Arc::new(store.invites()))
        .push_repo(Arc::new(store.push()))
        .event_sink(sink)
        .session_ttl(ttl)
        .build()
}

/// Register a fresh user and log them in
pub async fn register_and_login(ctx: &ServiceContext) -> LoginResponse {
    let auth = AuthService::new(ctx);
    let request = crate::fixtures::register_request();
    let email = request.email.clone();
    auth.register(request).await.expect("registration failed");
    auth.login(crate::fixtures::login_request(&email))
        .await
        .expect("login failed")
}

/// Create a guild with a text channel, returning (guild_id, channel_id)
pub async fn guild_with_channel(ctx: &ServiceContext, owner_id: Snowflake) -> (Snowflake, Snowflake) {
    let guild = GuildService::new(ctx)
        .create_guild(
            owner_id,
            CreateGuildRequest {
                name: "testing grounds".to_string(),
                description: None,
            },
        )
        .await
        .expect("guild creation failed");

    let channel = ChannelService::new(ctx)
        .create_channel(
            guild.id,
            owner_id,
            CreateChannelRequest {
                name: "general".to_string(),
                topic: None,
            },
        )
        .await
        .expect("channel creation failed");

    (guild.id, channel.id)
}

/// An attached gateway connection with its receiving ends
pub struct TestConnection {
    pub id: String,
    pub connection: Arc<Connection>,
    pub rx: mpsc::Receiver<GatewayMessage>,
    pub close_rx: watch::Receiver<Option<CloseCode>>,
}

/// Attach an authenticated, subscribed connection to the manager
pub fn attach_connection(
    manager: &ConnectionManager,
    id: &str,
    capacity: usize,
    user_id: Snowflake,
    session_id: Snowflake,
    guild_ids: &[Snowflake],
    channels: &[(Snowflake, Option<Snowflake>)],
) -> TestConnection {
    let (connection, rx, close_rx) = manager.add_connection(id.to_string(), capacity);
    assert!(manager.authenticate_connection(id, user_id, session_id));
    assert!(manager.subscribe(id, guild_ids, channels));
    TestConnection {
        id: id.to_string(),
        connection,
        rx,
        close_rx,
    }
}

/// Receive the next queued gateway message, or panic after one second
pub async fn recv_message(rx: &mut mpsc::Receiver<GatewayMessage>) -> GatewayMessage {
    timeout(StdDuration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for gateway message")
        .expect("connection queue closed")
}

/// Drain whatever is immediately queued
pub fn drain_messages(rx: &mut mpsc::Receiver<GatewayMessage>) -> Vec<GatewayMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}
