//! Wire frame shared by both directions of the gateway socket

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CloseCode, HelloPayload, IdentifyPayload, OpCode};

/// One JSON frame; `t` and `s` only appear on Dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: OpCode,

    /// Event type name for Dispatch frames
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Per-connection sequence number, strictly increasing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Payload; shape depends on `op`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    /// Dispatch frame carrying a committed event
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Hello frame, sent immediately after accept
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: Some(serde_json::to_value(payload).unwrap_or_default()),
        }
    }

    /// Acknowledgement for a client heartbeat
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck,
            t: None,
            s: None,
            d: None,
        }
    }

    /// Sent when the bound session stops being valid
    #[must_use]
    pub fn invalid_session() -> Self {
        Self {
            op: OpCode::InvalidSession,
            t: None,
            s: None,
            d: Some(Value::Bool(false)),
        }
    }

    /// The Identify payload, if this frame is one
    pub fn as_identify(&self) -> Option<IdentifyPayload> {
        if self.op != OpCode::Identify {
            return None;
        }
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// The heartbeat's echoed sequence, if this frame is a heartbeat
    pub fn as_heartbeat_seq(&self) -> Option<Option<u64>> {
        if self.op != OpCode::Heartbeat {
            return None;
        }
        Some(self.d.as_ref().and_then(serde_json::Value::as_u64))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// (code, reason) pair for a close frame
    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, String) {
        (code.as_u16(), code.description().to_string())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_message() {
        let msg = GatewayMessage::dispatch(
            "MESSAGE_CREATED",
            42,
            serde_json::json!({"message_id": "12345", "content": "Hello"}),
        );

        assert_eq!(msg.op, OpCode::Dispatch);
        assert_eq!(msg.t, Some("MESSAGE_CREATED".to_string()));
        assert_eq!(msg.s, Some(42));
        assert!(msg.d.is_some());
    }

    #[test]
    fn test_hello_message() {
        let msg = GatewayMessage::hello(HelloPayload::with_interval(45_000));
        assert_eq!(msg.op, OpCode::Hello);

        let json = msg.to_json().unwrap();
        assert!(json.contains("45000"));
    }

    #[test]
    fn test_heartbeat_ack_message() {
        let msg = GatewayMessage::heartbeat_ack();
        assert_eq!(msg.op, OpCode::HeartbeatAck);
        assert!(msg.t.is_none());
        assert!(msg.s.is_none());
        assert!(msg.d.is_none());
    }

    #[test]
    fn test_parse_identify() {
        let msg = GatewayMessage {
            op: OpCode::Identify,
            t: None,
            s: None,
            d: Some(serde_json::json!({
                "token": "abc123",
                "properties": {"os": "linux"}
            })),
        };

        let identify = msg.as_identify().unwrap();
        assert_eq!(identify.token, "abc123");
        assert!(identify.properties.is_some());
    }

    #[test]
    fn test_parse_heartbeat() {
        let msg = GatewayMessage {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: Some(Value::Number(41.into())),
        };
        assert_eq!(msg.as_heartbeat_seq().unwrap(), Some(41));

        let msg_null = GatewayMessage {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: None,
        };
        assert_eq!(msg_null.as_heartbeat_seq().unwrap(), None);
    }

    #[test]
    fn test_message_roundtrip() {
        let msg = GatewayMessage::dispatch("READY", 1, serde_json::json!({"v": 1}));
        let json = msg.to_json().unwrap();
        let parsed = GatewayMessage::from_json(&json).unwrap();

        assert_eq!(parsed.op, msg.op);
        assert_eq!(parsed.t, msg.t);
        assert_eq!(parsed.s, msg.s);
    }

    #[test]
    fn test_close_frame() {
        let (code, desc) = GatewayMessage::close_frame(CloseCode::HandshakeTimeout);
        assert_eq!(code, 4408);
        assert!(desc.contains("Handshake"));
    }
}
