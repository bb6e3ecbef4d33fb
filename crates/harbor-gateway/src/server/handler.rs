//! WebSocket handler
//!
//! Drives one connection through its lifecycle: Hello, a bounded handshake
//! window for Identify, then ordered dispatch until close. A periodic sweep
//! revalidates the bound session so a revoked session loses its connection
//! within one heartbeat interval.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, timeout};
use uuid::Uuid;

use harbor_service::{AuthService, PermissionService};

use crate::connection::Connection;
use crate::protocol::{
    CloseCode, GatewayMessage, HelloPayload, IdentifyPayload, OpCode, ReadyPayload,
};
use crate::server::GatewayState;

/// Time budget for store lookups made on the socket path
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let connection_id = Uuid::new_v4().to_string();
    let queue_capacity = state.config().gateway.queue_capacity;

    let (connection, rx, close_rx) = state
        .connection_manager()
        .add_connection(connection_id.clone(), queue_capacity);

    tracing::info!(connection_id = %connection_id, "websocket connection established");

    let (mut ws_sink, ws_stream) = socket.split();

    // Hello goes out immediately, bypassing the queue
    let heartbeat_interval_ms = state.config().gateway.heartbeat_interval_secs * 1000;
    let hello = GatewayMessage::hello(HelloPayload::with_interval(heartbeat_interval_ms));
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            tracing::warn!(connection_id = %connection_id, "failed to send hello");
            state.connection_manager().remove_connection(&connection_id);
            return;
        }
    }

    let mut recv_task = tokio::spawn(recv_loop(
        state.clone(),
        connection.clone(),
        ws_stream,
    ));
    let mut send_task = tokio::spawn(send_loop(ws_sink, rx, close_rx));
    let mut sweep_task = tokio::spawn(sweep_loop(state.clone(), connection.clone()));

    tokio::select! {
        result = &mut recv_task => {
            if let Ok(Some(close_code)) = result {
                connection.close(close_code);
            }
        }
        _ = &mut send_task => {}
        _ = &mut sweep_task => {}
    }

    sweep_task.abort();
    recv_task.abort();
    if !send_task.is_finished() {
        // Give the send task a moment to flush the close frame
        let _ = timeout(Duration::from_secs(5), &mut send_task).await;
    }

    state.connection_manager().remove_connection(&connection_id);
    tracing::info!(connection_id = %connection_id, "connection cleaned up");
}

/// Read frames from the client until the stream ends or errors
///
/// Returns the close code to send, if the connection should be closed
/// because of a protocol violation.
async fn recv_loop(
    state: GatewayState,
    connection: Arc<Connection>,
    mut ws_stream: SplitStream<WebSocket>,
) -> Option<CloseCode> {
    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(close_code) = handle_frame(&state, &connection, &text).await {
                    return Some(close_code);
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(connection_id = %connection.id(), "binary frames not supported");
                return Some(CloseCode::DecodeError);
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection.id(), "client closed connection");
                return None;
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection.id(), error = %e, "websocket error");
                return Some(CloseCode::UnknownError);
            }
        }
    }
    None
}

/// Handle one text frame from the client
async fn handle_frame(
    state: &GatewayState,
    connection: &Arc<Connection>,
    text: &str,
) -> Result<(), CloseCode> {
    let message = GatewayMessage::from_json(text).map_err(|e| {
        tracing::debug!(connection_id = %connection.id(), error = %e, "failed to parse frame");
        CloseCode::DecodeError
    })?;

    if let Some(_seq) = message.as_heartbeat_seq() {
        connection.record_heartbeat();
        if connection.try_send(GatewayMessage::heartbeat_ack()).is_err() {
            return Err(CloseCode::QueueOverflow);
        }
        return Ok(());
    }

    if message.op == OpCode::Identify {
        let payload = message.as_identify().ok_or(CloseCode::DecodeError)?;
        return handle_identify(state, connection, payload).await;
    }

    tracing::debug!(
        connection_id = %connection.id(),
        op = %message.op,
        "unexpected opcode from client"
    );
    Err(CloseCode::UnknownOpcode)
}

/// Authenticate the connection and seed its subscriptions
async fn handle_identify(
    state: &GatewayState,
    connection: &Arc<Connection>,
    payload: IdentifyPayload,
) -> Result<(), CloseCode> {
    if connection.is_authenticated() {
        return Err(CloseCode::AlreadyAuthenticated);
    }

    let auth = AuthService::new(state.services());
    let authenticated = match timeout(LOOKUP_TIMEOUT, auth.authenticate(&payload.token)).await {
        Ok(Ok(authenticated)) => authenticated,
        Ok(Err(e)) => {
            tracing::debug!(connection_id = %connection.id(), error = %e, "identify rejected");
            return Err(CloseCode::AuthenticationFailed);
        }
        Err(_) => {
            tracing::warn!(connection_id = %connection.id(), "identify lookup timed out");
            return Err(CloseCode::UnknownError);
        }
    };

    let user_id = authenticated.user.id;
    let session_id = authenticated.session.id;

    let permissions = PermissionService::new(state.services());
    let (guild_ids, channels) =
        match timeout(LOOKUP_TIMEOUT, permissions.visible_channels(user_id)).await {
            Ok(Ok(visible)) => visible,
            Ok(Err(e)) => {
                tracing::warn!(connection_id = %connection.id(), error = %e, "subscription seed failed");
                return Err(CloseCode::UnknownError);
            }
            Err(_) => return Err(CloseCode::UnknownError),
        };

    let manager = state.connection_manager();
    manager.authenticate_connection(connection.id(), user_id, session_id);
    manager.subscribe(connection.id(), &guild_ids, &channels);
    connection.record_heartbeat();

    let ready = ReadyPayload {
        user_id: user_id.to_string(),
        guild_ids: guild_ids.iter().map(ToString::to_string).collect(),
        channel_ids: channels.iter().map(|(c, _)| c.to_string()).collect(),
    };
    let ready_value = serde_json::to_value(ready).map_err(|_| CloseCode::UnknownError)?;
    let seq = connection.next_sequence();
    if connection
        .try_send(GatewayMessage::dispatch("READY", seq, ready_value))
        .is_err()
    {
        return Err(CloseCode::QueueOverflow);
    }

    tracing::info!(
        connection_id = %connection.id(),
        %user_id,
        guilds = guild_ids.len(),
        channels = channels.len(),
        "connection identified"
    );
    Ok(())
}

/// Drain the outbound queue into the socket; a close signal flushes a
/// close frame and ends the task
async fn send_loop(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<GatewayMessage>,
    mut close_rx: watch::Receiver<Option<CloseCode>>,
) {
    loop {
        tokio::select! {
            changed = close_rx.changed() => {
                let code = *close_rx.borrow_and_update();
                if let Some(code) = code {
                    let (code, reason) = GatewayMessage::close_frame(code);
                    let _ = ws_sink
                        .send(Message::Close(Some(CloseFrame {
                            code,
                            reason: reason.into(),
                        })))
                        .await;
                    break;
                }
                if changed.is_err() {
                    break;
                }
            }
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let Ok(json) = msg.to_json() else { continue };
                if ws_sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }
    let _ = ws_sink.close().await;
}

/// Handshake watchdog and session-revalidation sweep
///
/// Ends (closing the connection) when the handshake window lapses without
/// Identify, heartbeats stop, or the bound session is revoked or expired.
async fn sweep_loop(state: GatewayState, connection: Arc<Connection>) {
    let gateway = &state.config().gateway;
    let handshake_window = Duration::from_secs(gateway.handshake_timeout_secs);
    let heartbeat_interval = Duration::from_secs(gateway.heartbeat_interval_secs);

    sleep(handshake_window).await;
    if !connection.is_authenticated() {
        tracing::info!(connection_id = %connection.id(), "handshake window lapsed");
        connection.close(CloseCode::HandshakeTimeout);
        return;
    }

    let mut ticker = interval(heartbeat_interval);
    ticker.tick().await; // immediate first tick
    loop {
        ticker.tick().await;

        if connection.time_since_heartbeat() > heartbeat_interval * 2 {
            tracing::info!(connection_id = %connection.id(), "heartbeat lapsed");
            connection.close(CloseCode::SessionTimeout);
            return;
        }

        let Some(session_id) = connection.session_id() else {
            return;
        };
        match timeout(
            LOOKUP_TIMEOUT,
            state.services().session_repo().find_by_id(session_id),
        )
        .await
        {
            Ok(Ok(Some(session))) if !session.revoked && !session.is_expired() => {}
            Ok(Ok(_)) => {
                tracing::info!(
                    connection_id = %connection.id(),
                    %session_id,
                    "bound session no longer valid"
                );
                let _ = connection.try_send(GatewayMessage::invalid_session());
                connection.close(CloseCode::AuthenticationFailed);
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!(connection_id = %connection.id(), error = %e, "session sweep failed");
            }
            Err(_) => {
                tracing::warn!(connection_id = %connection.id(), "session sweep timed out");
            }
        }
    }
}
