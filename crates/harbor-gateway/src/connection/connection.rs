//! Individual WebSocket connection

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};

use harbor_core::Snowflake;

use crate::protocol::{CloseCode, GatewayMessage};

/// Subscriptions of one connection
///
/// Channels remember their owning guild so a guild revocation can sever
/// the guild's channels in the same step. DM channels carry no guild.
#[derive(Default)]
struct Subscriptions {
    guilds: HashSet<Snowflake>,
    channels: HashMap<Snowflake, Option<Snowflake>>,
}

/// A single WebSocket connection
///
/// The outbound queue is bounded; writers use `try_send` and a full queue
/// costs this connection its life, never the publisher's progress.
pub struct Connection {
    /// Unique connection id
    id: String,

    /// Authenticated user (None until Identify)
    user_id: RwLock<Option<Snowflake>>,

    /// Backing auth session (None until Identify)
    session_id: RwLock<Option<Snowflake>>,

    /// Bounded outbound queue
    sender: mpsc::Sender<GatewayMessage>,

    /// Close signal consumed by the socket task
    close_tx: watch::Sender<Option<CloseCode>>,

    /// Last dispatch sequence number sent
    sequence: AtomicU64,

    subscriptions: RwLock<Subscriptions>,

    /// Last heartbeat received
    last_heartbeat: RwLock<Instant>,

    created_at: Instant,
}

impl Connection {
    /// Create a connection with a bounded outbound queue
    ///
    /// Returns the connection plus the queue receiver and close receiver
    /// for the socket's send task.
    pub fn new(
        id: String,
        queue_capacity: usize,
    ) -> (
        Arc<Self>,
        mpsc::Receiver<GatewayMessage>,
        watch::Receiver<Option<CloseCode>>,
    ) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (close_tx, close_rx) = watch::channel(None);
        let connection = Arc::new(Self {
            id,
            user_id: RwLock::new(None),
            session_id: RwLock::new(None),
            sender: tx,
            close_tx,
            sequence: AtomicU64::new(0),
            subscriptions: RwLock::new(Subscriptions::default()),
            last_heartbeat: RwLock::new(Instant::now()),
            created_at: Instant::now(),
        });
        (connection, rx, close_rx)
    }

    /// Get the connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the authenticated user id
    pub fn user_id(&self) -> Option<Snowflake> {
        *self.user_id.read()
    }

    /// Get the backing session id
    pub fn session_id(&self) -> Option<Snowflake> {
        *self.session_id.read()
    }

    /// Bind the connection to an authenticated session
    pub fn authenticate(&self, user_id: Snowflake, session_id: Snowflake) {
        *self.user_id.write() = Some(user_id);
        *self.session_id.write() = Some(session_id);
    }

    /// Check if the connection is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.user_id.read().is_some()
    }

    /// Get the next dispatch sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get the current sequence number
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record a heartbeat received
    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.write() = Instant::now();
    }

    /// Get time since last heartbeat
    pub fn time_since_heartbeat(&self) -> std::time::Duration {
        self.last_heartbeat.read().elapsed()
    }

    /// Subscribe to a guild
    pub fn subscribe_guild(&self, guild_id: Snowflake) {
        self.subscriptions.write().guilds.insert(guild_id);
    }

    /// Subscribe to a channel, remembering its owning guild
    pub fn subscribe_channel(&self, channel_id: Snowflake, guild_id: Option<Snowflake>) {
        self.subscriptions.write().channels.insert(channel_id, guild_id);
    }

    /// Drop one channel subscription; true if it existed
    pub fn unsubscribe_channel(&self, channel_id: Snowflake) -> bool {
        self.subscriptions.write().channels.remove(&channel_id).is_some()
    }

    /// Drop a guild and all its channels; returns the channels dropped
    pub fn unsubscribe_guild(&self, guild_id: Snowflake) -> Vec<Snowflake> {
        let mut subs = self.subscriptions.write();
        subs.guilds.remove(&guild_id);
        let dropped: Vec<Snowflake> = subs
            .channels
            .iter()
            .filter(|(_, g)| **g == Some(guild_id))
            .map(|(c, _)| *c)
            .collect();
        for channel_id in &dropped {
            subs.channels.remove(channel_id);
        }
        dropped
    }

    /// Check a guild subscription
    pub fn is_subscribed_to_guild(&self, guild_id: Snowflake) -> bool {
        self.subscriptions.read().guilds.contains(&guild_id)
    }

    /// Check a channel subscription
    pub fn is_subscribed_to_channel(&self, channel_id: Snowflake) -> bool {
        self.subscriptions.read().channels.contains_key(&channel_id)
    }

    /// All subscribed guilds
    pub fn guilds(&self) -> Vec<Snowflake> {
        self.subscriptions.read().guilds.iter().copied().collect()
    }

    /// All subscribed channels
    pub fn channels(&self) -> Vec<Snowflake> {
        self.subscriptions.read().channels.keys().copied().collect()
    }

    /// Get connection age
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Queue a message without blocking
    pub fn try_send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.sender.try_send(message)
    }

    /// Signal the socket task to close with the given code
    ///
    /// Idempotent; the first code wins.
    pub fn close(&self, code: CloseCode) {
        self.close_tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(code);
                true
            } else {
                false
            }
        });
    }

    /// Check if the outbound queue is gone
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_starts_unauthenticated() {
        let (conn, _rx, _close) = Connection::new("c1".to_string(), 8);
        assert_eq!(conn.id(), "c1");
        assert!(conn.user_id().is_none());
        assert!(!conn.is_authenticated());
    }

    #[test]
    fn test_authenticate_binds_user_and_session() {
        let (conn, _rx, _close) = Connection::new("c1".to_string(), 8);
        conn.authenticate(Snowflake::new(1), Snowflake::new(2));
        assert!(conn.is_authenticated());
        assert_eq!(conn.user_id(), Some(Snowflake::new(1)));
        assert_eq!(conn.session_id(), Some(Snowflake::new(2)));
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let (conn, _rx, _close) = Connection::new("c1".to_string(), 8);
        assert_eq!(conn.current_sequence(), 0);
        assert_eq!(conn.next_sequence(), 1);
        assert_eq!(conn.next_sequence(), 2);
        assert_eq!(conn.current_sequence(), 2);
    }

    #[test]
    fn test_guild_revocation_drops_its_channels() {
        let (conn, _rx, _close) = Connection::new("c1".to_string(), 8);
        let guild = Snowflake::new(10);
        conn.subscribe_guild(guild);
        conn.subscribe_channel(Snowflake::new(11), Some(guild));
        conn.subscribe_channel(Snowflake::new(12), Some(guild));
        conn.subscribe_channel(Snowflake::new(99), None); // DM

        let dropped = conn.unsubscribe_guild(guild);
        assert_eq!(dropped.len(), 2);
        assert!(!conn.is_subscribed_to_guild(guild));
        assert!(!conn.is_subscribed_to_channel(Snowflake::new(11)));
        assert!(conn.is_subscribed_to_channel(Snowflake::new(99)));
    }

    #[test]
    fn test_try_send_full_queue_errors() {
        let (conn, _rx, _close) = Connection::new("c1".to_string(), 1);
        assert!(conn.try_send(GatewayMessage::heartbeat_ack()).is_ok());
        assert!(conn.try_send(GatewayMessage::heartbeat_ack()).is_err());
    }

    #[test]
    fn test_close_first_code_wins() {
        let (conn, _rx, mut close) = Connection::new("c1".to_string(), 1);
        conn.close(CloseCode::QueueOverflow);
        conn.close(CloseCode::SessionTimeout);
        assert_eq!(*close.borrow_and_update(), Some(CloseCode::QueueOverflow));
    }
}
