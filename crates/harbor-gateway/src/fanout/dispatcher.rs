//! Fan-out dispatcher
//!
//! Implements the `EventSink` port over a single consumer task. All
//! publishes and revocations flow through one ordered queue, so events
//! published for the same channel in commit order reach each subscriber
//! in that order, and a revocation acknowledged to the caller is ordered
//! after every event published before it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use harbor_core::{DomainEvent, EventRoute, EventSink, Snowflake};

use crate::connection::ConnectionManager;

enum Command {
    Publish {
        route: EventRoute,
        event_type: &'static str,
        payload: Value,
    },
    RevokeChannel {
        user_id: Snowflake,
        channel_id: Snowflake,
        ack: oneshot::Sender<()>,
    },
    RevokeGuild {
        user_id: Snowflake,
        guild_id: Snowflake,
        ack: oneshot::Sender<()>,
    },
    DropChannel {
        channel_id: Snowflake,
        ack: oneshot::Sender<()>,
    },
    CloseSession {
        session_id: Snowflake,
        ack: oneshot::Sender<()>,
    },
}

/// Routes committed domain events to subscribed connections
///
/// Queue writers never block: publishes are fire-and-forget into the
/// unbounded command queue, and per-connection delivery uses `try_send`
/// against bounded queues (overflow drops the connection, not the event).
/// Revocations await processing, which is the pre-ack guarantee.
pub struct FanoutDispatcher {
    tx: mpsc::UnboundedSender<Command>,
}

impl FanoutDispatcher {
    /// Spawn the consumer task and return the sink handle
    pub fn start(manager: Arc<ConnectionManager>) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(manager, rx));
        info!("fanout dispatcher started");
        Arc::new(Self { tx })
    }

    async fn send_and_wait(&self, build: impl FnOnce(oneshot::Sender<()>) -> Command) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(build(ack_tx)).is_err() {
            error!("fanout dispatcher is gone, revocation dropped");
            return;
        }
        // Err means the dispatcher died mid-command; nothing left to wait on
        let _ = ack_rx.await;
    }
}

#[async_trait]
impl EventSink for FanoutDispatcher {
    async fn publish(&self, route: EventRoute, event: DomainEvent) {
        let event_type = event.event_type();
        let payload = match serde_json::to_value(&event) {
            Ok(v) => v,
            Err(e) => {
                error!(event_type, error = %e, "failed to serialize event");
                return;
            }
        };
        if self
            .tx
            .send(Command::Publish {
                route,
                event_type,
                payload,
            })
            .is_err()
        {
            error!(event_type, "fanout dispatcher is gone, event dropped");
        }
    }

    async fn revoke_channel(&self, user_id: Snowflake, channel_id: Snowflake) {
        self.send_and_wait(|ack| Command::RevokeChannel {
            user_id,
            channel_id,
            ack,
        })
        .await;
    }

    async fn revoke_guild(&self, user_id: Snowflake, guild_id: Snowflake) {
        self.send_and_wait(|ack| Command::RevokeGuild {
            user_id,
            guild_id,
            ack,
        })
        .await;
    }

    async fn drop_channel(&self, channel_id: Snowflake) {
        self.send_and_wait(|ack| Command::DropChannel { channel_id, ack })
            .await;
    }

    async fn close_session(&self, session_id: Snowflake) {
        self.send_and_wait(|ack| Command::CloseSession { session_id, ack })
            .await;
    }
}

async fn run(manager: Arc<ConnectionManager>, mut rx: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Publish {
                route,
                event_type,
                payload,
            } => {
                let targets = match route {
                    EventRoute::Channel(id) => manager.channel_connections(id),
                    EventRoute::Guild(id) => manager.guild_connections(id),
                    EventRoute::User(id) => manager.user_connections(id),
                };
                debug!(event_type, targets = targets.len(), "dispatching event");
                manager.dispatch_to(&targets, event_type, &payload);
            }
            Command::RevokeChannel {
                user_id,
                channel_id,
                ack,
            } => {
                manager.revoke_channel(user_id, channel_id);
                let _ = ack.send(());
            }
            Command::RevokeGuild {
                user_id,
                guild_id,
                ack,
            } => {
                manager.revoke_guild(user_id, guild_id);
                let _ = ack.send(());
            }
            Command::DropChannel { channel_id, ack } => {
                manager.drop_channel(channel_id);
                let _ = ack.send(());
            }
            Command::CloseSession { session_id, ack } => {
                manager.close_session(session_id);
                let _ = ack.send(());
            }
        }
    }
    info!("fanout dispatcher loop ended");
}
