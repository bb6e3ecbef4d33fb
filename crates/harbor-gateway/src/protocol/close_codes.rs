//! Gateway close codes, carried in the WebSocket close frame

use serde::{Deserialize, Serialize};

/// Why the server closed a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Unknown error occurred
    UnknownError = 4000,
    /// Invalid opcode sent
    UnknownOpcode = 4001,
    /// Invalid payload encoding (JSON decode error)
    DecodeError = 4002,
    /// Sent payload before Identify
    NotAuthenticated = 4003,
    /// Invalid token or revoked session
    AuthenticationFailed = 4004,
    /// Sent Identify twice
    AlreadyAuthenticated = 4005,
    /// No heartbeat within the allowed window
    SessionTimeout = 4009,
    /// Did not Identify within the handshake window
    HandshakeTimeout = 4408,
    /// Outbound queue overflowed; connection dropped
    QueueOverflow = 4429,
}

impl CloseCode {
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::UnknownError),
            4001 => Some(Self::UnknownOpcode),
            4002 => Some(Self::DecodeError),
            4003 => Some(Self::NotAuthenticated),
            4004 => Some(Self::AuthenticationFailed),
            4005 => Some(Self::AlreadyAuthenticated),
            4009 => Some(Self::SessionTimeout),
            4408 => Some(Self::HandshakeTimeout),
            4429 => Some(Self::QueueOverflow),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether a well-behaved client may reconnect after this close
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::UnknownError
                | Self::UnknownOpcode
                | Self::DecodeError
                | Self::AlreadyAuthenticated
                | Self::SessionTimeout
                | Self::HandshakeTimeout
                | Self::QueueOverflow
        )
    }

    /// Human-readable close reason
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "Unknown error occurred",
            Self::UnknownOpcode => "Invalid opcode sent",
            Self::DecodeError => "Invalid payload encoding",
            Self::NotAuthenticated => "Not authenticated",
            Self::AuthenticationFailed => "Authentication failed",
            Self::AlreadyAuthenticated => "Already authenticated",
            Self::SessionTimeout => "Session timeout",
            Self::HandshakeTimeout => "Handshake timeout",
            Self::QueueOverflow => "Outbound queue overflow",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnknownError => "UnknownError",
            Self::UnknownOpcode => "UnknownOpcode",
            Self::DecodeError => "DecodeError",
            Self::NotAuthenticated => "NotAuthenticated",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::AlreadyAuthenticated => "AlreadyAuthenticated",
            Self::SessionTimeout => "SessionTimeout",
            Self::HandshakeTimeout => "HandshakeTimeout",
            Self::QueueOverflow => "QueueOverflow",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_from_u16() {
        assert_eq!(CloseCode::from_u16(4000), Some(CloseCode::UnknownError));
        assert_eq!(CloseCode::from_u16(4408), Some(CloseCode::HandshakeTimeout));
        assert_eq!(CloseCode::from_u16(4429), Some(CloseCode::QueueOverflow));
        assert_eq!(CloseCode::from_u16(1000), None);
        assert_eq!(CloseCode::from_u16(4006), None);
    }

    #[test]
    fn test_should_reconnect() {
        assert!(CloseCode::HandshakeTimeout.should_reconnect());
        assert!(CloseCode::QueueOverflow.should_reconnect());
        assert!(CloseCode::SessionTimeout.should_reconnect());
        assert!(!CloseCode::NotAuthenticated.should_reconnect());
        assert!(!CloseCode::AuthenticationFailed.should_reconnect());
    }

    #[test]
    fn test_close_code_display() {
        let display = format!("{}", CloseCode::QueueOverflow);
        assert!(display.contains("4429"));
        assert!(display.contains("overflow"));
    }
}
