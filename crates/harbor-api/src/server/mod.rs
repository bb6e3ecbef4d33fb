//! Server setup and initialization
//!
//! Builds the shared service context over the in-memory store and runs the
//! REST listener and the WebSocket gateway listener from one process, so
//! both surfaces observe the same state and the same event order.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use chrono::Duration;
use harbor_common::{AppConfig, AppError};
use harbor_gateway::connection::ConnectionManager;
use harbor_gateway::fanout::FanoutDispatcher;
use harbor_gateway::server::GatewayState;
use harbor_service::{ServiceContext, ServiceContextBuilder};
use harbor_store::MemoryStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::apply_middleware;
use crate::routes::create_router;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let router = create_router();
    let router = apply_middleware(router);
    router.with_state(state)
}

/// Initialize all dependencies and create the API and gateway states
///
/// Both states share one [`ServiceContext`]; the gateway's fanout
/// dispatcher is the context's event sink, so every service-layer publish
/// flows through the gateway's ordered queue.
pub fn create_app_state(config: AppConfig) -> (AppState, GatewayState) {
    let config = Arc::new(config);
    let store = MemoryStore::new();

    let manager = ConnectionManager::new_shared();
    let dispatcher = FanoutDispatcher::start(manager.clone());

    let services = build_service_context(&store, &config, dispatcher);

    let api_state = AppState::new(services.clone(), config.clone());
    let gateway_state = GatewayState::new(services, manager, config);
    (api_state, gateway_state)
}

/// Wire a service context over the given store
fn build_service_context(
    store: &MemoryStore,
    config: &AppConfig,
    dispatcher: Arc<FanoutDispatcher>,
) -> ServiceContext {
    ServiceContextBuilder::default()
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
        .event_sink(dispatcher)
        .worker_id(config.snowflake.worker_id)
        .session_ttl(Duration::days(config.session.token_ttl_days))
        .build()
}

/// Run the HTTP server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("failed to bind to {addr}: {e}")))?;

    info!("API listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Config(format!("server error: {e}")))?;

    Ok(())
}

/// Run the API and gateway servers with the given configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let api_addr = parse_addr(&config.api.address())?;
    let gateway_addr = parse_addr(&config.gateway_server.address())?;

    let (api_state, gateway_state) = create_app_state(config);

    let api_app = create_app(api_state);
    let gateway_app = harbor_gateway::server::create_app(gateway_state);

    tokio::try_join!(
        run_server(api_app, api_addr),
        harbor_gateway::server::run_server(gateway_app, gateway_addr),
    )?;

    Ok(())
}

fn parse_addr(raw: &str) -> Result<SocketAddr, AppError> {
    raw.parse()
        .map_err(|e| AppError::Config(format!("invalid listen address {raw}: {e}")))
}
