//! Connection manager
//!
//! Registry of live connections with user/guild/channel/session routing
//! indexes, all behind `DashMap` for concurrent access.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use harbor_core::Snowflake;

use super::Connection;
use crate::protocol::{CloseCode, GatewayMessage};

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by connection id
    connections: DashMap<String, Arc<Connection>>,

    /// User id -> connection ids
    user_index: DashMap<Snowflake, HashSet<String>>,

    /// Guild id -> connection ids
    guild_index: DashMap<Snowflake, HashSet<String>>,

    /// Channel id -> connection ids
    channel_index: DashMap<Snowflake, HashSet<String>>,

    /// Auth session id -> connection id
    session_index: DashMap<Snowflake, String>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
            guild_index: DashMap::new(),
            channel_index: DashMap::new(),
            session_index: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection with a bounded outbound queue
    pub fn add_connection(
        &self,
        id: String,
        queue_capacity: usize,
    ) -> (
        Arc<Connection>,
        mpsc::Receiver<GatewayMessage>,
        watch::Receiver<Option<CloseCode>>,
    ) {
        let (connection, rx, close_rx) = Connection::new(id.clone(), queue_capacity);
        self.connections.insert(id.clone(), connection.clone());
        tracing::debug!(connection_id = %id, "connection added");
        (connection, rx, close_rx)
    }

    /// Remove a connection and every index entry that references it
    pub fn remove_connection(&self, id: &str) {
        let Some((_, connection)) = self.connections.remove(id) else {
            return;
        };

        if let Some(user_id) = connection.user_id() {
            self.user_index.alter(&user_id, |_, mut ids| {
                ids.remove(id);
                ids
            });
            self.user_index.retain(|_, ids| !ids.is_empty());
        }
        if let Some(session_id) = connection.session_id() {
            self.session_index
                .remove_if(&session_id, |_, bound| bound == id);
        }
        for guild_id in connection.guilds() {
            self.guild_index.alter(&guild_id, |_, mut ids| {
                ids.remove(id);
                ids
            });
        }
        for channel_id in connection.channels() {
            self.channel_index.alter(&channel_id, |_, mut ids| {
                ids.remove(id);
                ids
            });
        }
        self.guild_index.retain(|_, ids| !ids.is_empty());
        self.channel_index.retain(|_, ids| !ids.is_empty());

        tracing::debug!(connection_id = %id, "connection removed");
    }

    /// Get a connection by id
    pub fn get_connection(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| r.clone())
    }

    /// Bind a connection to an authenticated session
    pub fn authenticate_connection(
        &self,
        id: &str,
        user_id: Snowflake,
        session_id: Snowflake,
    ) -> bool {
        let Some(connection) = self.connections.get(id) else {
            return false;
        };
        connection.authenticate(user_id, session_id);
        self.user_index
            .entry(user_id)
            .or_default()
            .insert(id.to_string());
        self.session_index.insert(session_id, id.to_string());

        tracing::debug!(connection_id = %id, %user_id, %session_id, "connection authenticated");
        true
    }

    /// Register guild and channel subscriptions for a connection
    pub fn subscribe(
        &self,
        id: &str,
        guild_ids: &[Snowflake],
        channels: &[(Snowflake, Option<Snowflake>)],
    ) -> bool {
        let Some(connection) = self.connections.get(id) else {
            return false;
        };
        for guild_id in guild_ids {
            connection.subscribe_guild(*guild_id);
            self.guild_index
                .entry(*guild_id)
                .or_default()
                .insert(id.to_string());
        }
        for (channel_id, guild_id) in channels {
            connection.subscribe_channel(*channel_id, *guild_id);
            self.channel_index
                .entry(*channel_id)
                .or_default()
                .insert(id.to_string());
        }
        true
    }

    /// Drop one user's subscription to one channel
    pub fn revoke_channel(&self, user_id: Snowflake, channel_id: Snowflake) {
        for connection in self.user_connections(user_id) {
            if connection.unsubscribe_channel(channel_id) {
                self.channel_index.alter(&channel_id, |_, mut ids| {
                    ids.remove(connection.id());
                    ids
                });
            }
        }
        self.channel_index.retain(|_, ids| !ids.is_empty());
    }

    /// Drop one user's subscriptions to a guild and all its channels
    pub fn revoke_guild(&self, user_id: Snowflake, guild_id: Snowflake) {
        for connection in self.user_connections(user_id) {
            let dropped = connection.unsubscribe_guild(guild_id);
            self.guild_index.alter(&guild_id, |_, mut ids| {
                ids.remove(connection.id());
                ids
            });
            for channel_id in dropped {
                self.channel_index.alter(&channel_id, |_, mut ids| {
                    ids.remove(connection.id());
                    ids
                });
            }
        }
        self.guild_index.retain(|_, ids| !ids.is_empty());
        self.channel_index.retain(|_, ids| !ids.is_empty());
    }

    /// Drop every subscription to a channel
    pub fn drop_channel(&self, channel_id: Snowflake) {
        if let Some((_, ids)) = self.channel_index.remove(&channel_id) {
            for id in ids {
                if let Some(connection) = self.get_connection(&id) {
                    connection.unsubscribe_channel(channel_id);
                }
            }
        }
    }

    /// Close the connection bound to an auth session
    pub fn close_session(&self, session_id: Snowflake) {
        if let Some(id) = self.session_index.get(&session_id).map(|r| r.clone()) {
            if let Some(connection) = self.get_connection(&id) {
                let _ = connection.try_send(GatewayMessage::invalid_session());
                connection.close(CloseCode::AuthenticationFailed);
            }
        }
    }

    /// All connections of a user
    pub fn user_connections(&self, user_id: Snowflake) -> Vec<Arc<Connection>> {
        self.collect(self.user_index.get(&user_id).as_deref())
    }

    /// All connections subscribed to a guild
    pub fn guild_connections(&self, guild_id: Snowflake) -> Vec<Arc<Connection>> {
        self.collect(self.guild_index.get(&guild_id).as_deref())
    }

    /// All connections subscribed to a channel
    pub fn channel_connections(&self, channel_id: Snowflake) -> Vec<Arc<Connection>> {
        self.collect(self.channel_index.get(&channel_id).as_deref())
    }

    fn collect(&self, ids: Option<&HashSet<String>>) -> Vec<Arc<Connection>> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.connections.get(id).map(|c| c.clone()))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Queue an event on every connection in `targets`
    ///
    /// A full queue drops only the overflowing connection (QueueOverflow);
    /// the event and every other connection are unaffected.
    pub fn dispatch_to(&self, targets: &[Arc<Connection>], event_type: &str, payload: &Value) {
        for connection in targets {
            let seq = connection.next_sequence();
            let message = GatewayMessage::dispatch(event_type, seq, payload.clone());
            match connection.try_send(message) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = %connection.id(),
                        event_type,
                        "outbound queue full, dropping connection"
                    );
                    connection.close(CloseCode::QueueOverflow);
                    self.remove_connection(connection.id());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.remove_connection(connection.id());
                }
            }
        }
    }

    /// Total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of unique authenticated users
    pub fn user_count(&self) -> usize {
        self.user_index.len()
    }

    /// Check if a connection exists
    pub fn has_connection(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_index.len())
            .field("guilds", &self.guild_index.len())
            .field("channels", &self.channel_index.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_add_remove_connection() {
        let manager = ConnectionManager::new();
        let (conn, _rx, _close) = manager.add_connection("c1".to_string(), 8);
        assert_eq!(conn.id(), "c1");
        assert_eq!(manager.connection_count(), 1);

        manager.remove_connection("c1");
        assert_eq!(manager.connection_count(), 0);
        assert!(!manager.has_connection("c1"));
    }

    #[test]
    fn test_authenticate_and_session_index() {
        let manager = ConnectionManager::new();
        let _guard = manager.add_connection("c1".to_string(), 8);

        assert!(manager.authenticate_connection("c1", Snowflake::new(1), Snowflake::new(9)));
        assert_eq!(manager.user_count(), 1);
        assert_eq!(manager.user_connections(Snowflake::new(1)).len(), 1);

        manager.close_session(Snowflake::new(9));
        let conn = manager.get_connection("c1").unwrap();
        assert!(conn.is_authenticated());
    }

    #[test]
    fn test_channel_fanout_reaches_subscribers() {
        let manager = ConnectionManager::new();
        let (_c1, mut rx1, _close1) = manager.add_connection("c1".to_string(), 8);
        let (_c2, _rx2, _close2) = manager.add_connection("c2".to_string(), 8);

        let channel = Snowflake::new(5);
        manager.subscribe("c1", &[], &[(channel, None)]);

        let targets = manager.channel_connections(channel);
        assert_eq!(targets.len(), 1);
        manager.dispatch_to(&targets, "MESSAGE_CREATED", &json!({"x": 1}));

        let msg = rx1.try_recv().unwrap();
        assert_eq!(msg.t.as_deref(), Some("MESSAGE_CREATED"));
        assert_eq!(msg.s, Some(1));
    }

    #[test]
    fn test_overflow_drops_only_that_connection() {
        let manager = ConnectionManager::new();
        let (_c1, _rx1, mut close1) = manager.add_connection("c1".to_string(), 1);
        let (_c2, mut rx2, _close2) = manager.add_connection("c2".to_string(), 8);

        let channel = Snowflake::new(5);
        manager.subscribe("c1", &[], &[(channel, None)]);
        manager.subscribe("c2", &[], &[(channel, None)]);

        let targets = manager.channel_connections(channel);
        manager.dispatch_to(&targets, "E", &json!({}));
        manager.dispatch_to(&targets, "E", &json!({}));

        // c1's single-slot queue overflowed; c2 got both events
        assert_eq!(
            *close1.borrow_and_update(),
            Some(CloseCode::QueueOverflow)
        );
        assert!(!manager.has_connection("c1"));
        assert!(rx2.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_revoke_guild_clears_indexes() {
        let manager = ConnectionManager::new();
        let _guard = manager.add_connection("c1".to_string(), 8);
        manager.authenticate_connection("c1", Snowflake::new(1), Snowflake::new(9));

        let guild = Snowflake::new(10);
        let channel = Snowflake::new(11);
        manager.subscribe("c1", &[guild], &[(channel, Some(guild))]);
        assert_eq!(manager.guild_connections(guild).len(), 1);

        manager.revoke_guild(Snowflake::new(1), guild);
        assert!(manager.guild_connections(guild).is_empty());
        assert!(manager.channel_connections(channel).is_empty());
    }
}
