//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::handlers::{
    auth, channels, guilds, health, invites, members, messages, reactions, roles,
};
use crate::state::AppState;

/// Create the main API router with all routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1_routes())
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(guild_routes())
        .merge(channel_routes())
        .merge(invite_routes())
}

/// Authentication and session routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout/all", post(auth::logout_all))
        .route("/auth/sessions", get(auth::list_sessions))
        .route("/auth/mfa", post(auth::enable_mfa))
        .route("/auth/mfa", delete(auth::disable_mfa))
}

/// Current-user routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/@me/guilds", get(guilds::list_my_guilds))
        .route("/users/@me/channels", post(channels::open_dm))
}

/// Guild routes
fn guild_routes() -> Router<AppState> {
    Router::new()
        .route("/guilds", post(guilds::create_guild))
        .route("/guilds/:guild_id", get(guilds::get_guild))
        // Guild channels
        .route("/guilds/:guild_id/channels", get(channels::list_guild_channels))
        .route("/guilds/:guild_id/channels", post(channels::create_channel))
        // Guild members
        .route("/guilds/:guild_id/members", get(members::list_members))
        .route("/guilds/:guild_id/members/@me", delete(members::leave_guild))
        .route("/guilds/:guild_id/members/:user_id", delete(members::kick_member))
        .route(
            "/guilds/:guild_id/members/:user_id/roles/:role_id",
            put(members::assign_role),
        )
        .route(
            "/guilds/:guild_id/members/:user_id/roles/:role_id",
            delete(members::remove_role),
        )
        // Guild roles
        .route("/guilds/:guild_id/roles", get(roles::list_roles))
        .route("/guilds/:guild_id/roles", post(roles::create_role))
        .route("/guilds/:guild_id/roles/:role_id", patch(roles::update_role))
        .route("/guilds/:guild_id/roles/:role_id", delete(roles::delete_role))
        // Guild invites
        .route("/guilds/:guild_id/invites", get(invites::list_guild_invites))
        .route("/guilds/:guild_id/invites", post(invites::create_invite))
}

/// Channel routes
fn channel_routes() -> Router<AppState> {
    Router::new()
        .route("/channels/:channel_id", get(channels::get_channel))
        .route("/channels/:channel_id", patch(channels::update_channel))
        .route("/channels/:channel_id", delete(channels::delete_channel))
        // Channel messages
        .route("/channels/:channel_id/messages", get(messages::list_messages))
        .route("/channels/:channel_id/messages", post(messages::create_message))
        .route(
            "/channels/:channel_id/messages/:message_id",
            patch(messages::update_message),
        )
        .route(
            "/channels/:channel_id/messages/:message_id",
            delete(messages::delete_message),
        )
        // Message reactions
        .route(
            "/channels/:channel_id/messages/:message_id/reactions",
            get(reactions::list_reactions),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/reactions/:emoji/@me",
            put(reactions::add_reaction),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/reactions/:emoji/@me",
            delete(reactions::remove_reaction),
        )
}

/// Invite routes
fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/invites/:invite_code", get(invites::get_invite))
        .route("/invites/:invite_code", post(invites::redeem_invite))
        .route("/invites/:invite_code", delete(invites::delete_invite))
}
