//! Gateway operation codes

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What kind of frame this is; serialized as its bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Committed event, server to client
    Dispatch = 0,
    /// Keep-alive, client to server
    Heartbeat = 1,
    /// Bearer-token handshake, client to server
    Identify = 2,
    /// The bound session stopped being valid, server to client
    InvalidSession = 7,
    /// First frame after accept, server to client
    Hello = 10,
    /// Heartbeat acknowledgement, server to client
    HeartbeatAck = 11,
}

impl OpCode {
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            7 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether clients are allowed to send this op
    #[must_use]
    pub const fn is_client_op(self) -> bool {
        matches!(self, Self::Heartbeat | Self::Identify)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::InvalidSession => "InvalidSession",
            Self::Hello => "Hello",
            Self::HeartbeatAck => "HeartbeatAck",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for OpCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid op code: {value}")))
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::Dispatch));
        assert_eq!(OpCode::from_u8(1), Some(OpCode::Heartbeat));
        assert_eq!(OpCode::from_u8(2), Some(OpCode::Identify));
        assert_eq!(OpCode::from_u8(7), Some(OpCode::InvalidSession));
        assert_eq!(OpCode::from_u8(10), Some(OpCode::Hello));
        assert_eq!(OpCode::from_u8(11), Some(OpCode::HeartbeatAck));
        assert_eq!(OpCode::from_u8(3), None);
        assert_eq!(OpCode::from_u8(255), None);
    }

    #[test]
    fn test_client_ops() {
        assert!(OpCode::Heartbeat.is_client_op());
        assert!(OpCode::Identify.is_client_op());
        assert!(!OpCode::Dispatch.is_client_op());
        assert!(!OpCode::Hello.is_client_op());
        assert!(!OpCode::InvalidSession.is_client_op());
    }

    #[test]
    fn test_opcode_serialization() {
        let json = serde_json::to_string(&OpCode::Hello).unwrap();
        assert_eq!(json, "10");

        let op: OpCode = serde_json::from_str("2").unwrap();
        assert_eq!(op, OpCode::Identify);
    }
}
