//! Permission bitmask for guild-scoped access control
//!
//! A member's effective permission set is the bitwise OR of every role they
//! hold; role display position never influences the result. Guild owners
//! bypass the computation entirely with [`Permissions::ALL`].

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Guild permission flags
    ///
    /// Stored as a 64-bit integer, serialized as a string in JSON for
    /// JavaScript safety.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        /// Observe a channel: read messages and receive its live events
        const VIEW_CHANNEL     = 1 << 0;
        /// Send messages in text channels
        const SEND_MESSAGES    = 1 << 1;
        /// Delete or edit other users' messages
        const MANAGE_MESSAGES  = 1 << 2;
        /// Create, edit, delete channels
        const MANAGE_CHANNELS  = 1 << 3;
        /// Create, edit, delete, assign roles
        const MANAGE_ROLES     = 1 << 4;
        /// Edit guild settings
        const MANAGE_GUILD     = 1 << 5;
        /// Remove members from the guild
        const KICK_MEMBERS     = 1 << 6;
        /// Create shareable invite codes
        const CREATE_INVITES   = 1 << 7;
        /// Bypass all permission checks
        const ADMINISTRATOR    = 1 << 8;
        /// Upload files and images
        const ATTACH_FILES     = 1 << 9;
        /// Add emoji reactions
        const ADD_REACTIONS    = 1 << 10;

        /// Permissions carried by the default member role seeded at guild
        /// creation
        const DEFAULT = Self::VIEW_CHANNEL.bits()
            | Self::SEND_MESSAGES.bits()
            | Self::ADD_REACTIONS.bits()
            | Self::ATTACH_FILES.bits();

        /// All permissions (guild owner bypass mask)
        const ALL = u64::MAX;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Combine permissions from multiple roles by bitwise OR
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_truncate)
    }

    /// Names of all individual permissions that are set
    pub fn list(&self) -> Vec<&'static str> {
        const NAMES: [(Permissions, &str); 11] = [
            (Permissions::VIEW_CHANNEL, "VIEW_CHANNEL"),
            (Permissions::SEND_MESSAGES, "SEND_MESSAGES"),
            (Permissions::MANAGE_MESSAGES, "MANAGE_MESSAGES"),
            (Permissions::MANAGE_CHANNELS, "MANAGE_CHANNELS"),
            (Permissions::MANAGE_ROLES, "MANAGE_ROLES"),
            (Permissions::MANAGE_GUILD, "MANAGE_GUILD"),
            (Permissions::KICK_MEMBERS, "KICK_MEMBERS"),
            (Permissions::CREATE_INVITES, "CREATE_INVITES"),
            (Permissions::ADMINISTRATOR, "ADMINISTRATOR"),
            (Permissions::ATTACH_FILES, "ATTACH_FILES"),
            (Permissions::ADD_REACTIONS, "ADD_REACTIONS"),
        ];

        NAMES
            .iter()
            .filter(|(p, _)| self.contains(*p))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer of permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_truncate(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(perms: Permissions) -> Self {
        perms.bits()
    }
}
