//! Event sink - the gateway-facing port for committed domain events
//!
//! Services publish through this trait after a mutation commits. The live
//! gateway implements it by fanning events out to subscribed connections;
//! `NullEventSink` stands in where no gateway is attached (tests, batch
//! tooling).

use async_trait::async_trait;

use crate::events::{DomainEvent, EventRoute};
use crate::value_objects::Snowflake;

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver a committed event to the subscribers of `route`
    ///
    /// Calls made for the same channel route, in commit order, reach each
    /// subscriber in that order.
    async fn publish(&self, route: EventRoute, event: DomainEvent);

    /// Drop the user's live subscription to one channel
    ///
    /// Takes effect before the call returns: no event for the channel is
    /// delivered to this user's connections afterwards.
    async fn revoke_channel(&self, user_id: Snowflake, channel_id: Snowflake);

    /// Drop the user's live subscriptions to a guild and all its channels
    async fn revoke_guild(&self, user_id: Snowflake, guild_id: Snowflake);

    /// Drop every subscription to a channel (channel deleted)
    async fn drop_channel(&self, channel_id: Snowflake);

    /// Close every connection authenticated by the session
    async fn close_session(&self, session_id: Snowflake);
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn publish(&self, _route: EventRoute, _event: DomainEvent) {}

    async fn revoke_channel(&self, _user_id: Snowflake, _channel_id: Snowflake) {}

    async fn revoke_guild(&self, _user_id: Snowflake, _guild_id: Snowflake) {}

    async fn drop_channel(&self, _channel_id: Snowflake) {}

    async fn close_session(&self, _session_id: Snowflake) {}
}
