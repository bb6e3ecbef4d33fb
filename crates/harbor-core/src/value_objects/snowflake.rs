//! Snowflake ID - 64-bit time-ordered unique identifier
//!
//! Structure:
//! - Bits 63-22: Timestamp (milliseconds since custom epoch)
//! - Bits 21-12: Worker ID (0-1023)
//! - Bits 11-0:  Sequence number (0-4095)
//!
//! Because the high bits are the creation timestamp, comparing two IDs
//! recovers creation order without consulting any other field. Message
//! reply references rely on this: a reply may only target a strictly
//! smaller ID, so reference chains can never cycle.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// 64-bit time-ordered unique ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Custom epoch: 2025-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: i64 = 1_735_689_600_000;

    /// Create a new Snowflake from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Check if the Snowflake is zero (uninitialized)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Extract timestamp (milliseconds since Unix epoch)
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> 22) + Self::EPOCH
    }

    /// Extract worker ID (0-1023)
    #[inline]
    pub fn worker_id(&self) -> u16 {
        ((self.0 >> 12) & 0x3FF) as u16
    }

    /// Whether this ID was minted strictly before `other`
    #[inline]
    pub fn earlier_than(&self, other: Snowflake) -> bool {
        self.0 < other.0
    }

    /// Convert timestamp to `DateTime<Utc>`
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        use chrono::{TimeZone, Utc};
        Utc.timestamp_millis_opt(self.timestamp())
            .single()
            .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap())
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.parse::<i64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }
}

/// Error when parsing a Snowflake from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer snowflake ID")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                value
                    .parse::<i64>()
                    .map(Snowflake)
                    .map_err(|_| de::Error::custom("invalid snowflake string"))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// Thread-safe Snowflake ID generator
///
/// Lock-free: a single atomic holds the last issued ID, and each generation
/// takes the maximum of the current-time candidate and `last + 1`, so IDs
/// are strictly monotonic per process even when the clock stalls or steps
/// backwards.
pub struct SnowflakeGenerator {
    worker_id: u16,
    last: AtomicI64,
}

impl SnowflakeGenerator {
    /// Create a new generator with the given worker ID
    ///
    /// # Panics
    /// Panics if `worker_id >= 1024`
    pub fn new(worker_id: u16) -> Self {
        assert!(worker_id < 1024, "Worker ID must be < 1024");
        Self {
            worker_id,
            last: AtomicI64::new(0),
        }
    }

    /// Generate a new unique, strictly increasing Snowflake ID
    pub fn generate(&self) -> Snowflake {
        loop {
            let last = self.last.load(Ordering::Acquire);
            let candidate =
                ((self.current_timestamp() - Snowflake::EPOCH) << 22) | i64::from(self.worker_id) << 12;
            let next = candidate.max(last + 1);

            if self
                .last
                .compare_exchange(last, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Snowflake::new(next);
            }
        }
    }

    /// Get the worker ID of this generator
    pub fn worker_id(&self) -> u16 {
        self.worker_id
    }

    #[inline]
    fn current_timestamp(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_snowflake_parse_and_display() {
        let sf = Snowflake::parse("123456789").unwrap();
        assert_eq!(sf.into_inner(), 123456789);
        assert_eq!(sf.to_string(), "123456789");
        assert!(Snowflake::parse("invalid").is_err());
    }

    #[test]
    fn test_snowflake_serialize_as_string() {
        let sf = Snowflake::new(123456789012345678);
        let json = serde_json::to_string(&sf).unwrap();
        assert_eq!(json, "\"123456789012345678\"");

        let back: Snowflake = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sf);

        let from_number: Snowflake = serde_json::from_str("12345").unwrap();
        assert_eq!(from_number.into_inner(), 12345);
    }

    #[test]
    fn test_earlier_than() {
        let a = Snowflake::new(100);
        let b = Snowflake::new(200);
        assert!(a.earlier_than(b));
        assert!(!b.earlier_than(a));
        assert!(!a.earlier_than(a));
    }

    #[test]
    fn test_generator_ids_are_strictly_monotonic() {
        let gen = SnowflakeGenerator::new(1);
        let mut last = Snowflake::new(0);
        for _ in 0..10_000 {
            let id = gen.generate();
            assert!(last.earlier_than(id));
            last = id;
        }
    }

    #[test]
    fn test_generator_worker_id_preserved() {
        let gen = SnowflakeGenerator::new(42);
        assert_eq!(gen.generate().worker_id(), 42);
    }

    #[test]
    fn test_generator_thread_safety() {
        let gen = Arc::new(SnowflakeGenerator::new(1));
        let ids = Arc::new(std::sync::Mutex::new(HashSet::new()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gen = Arc::clone(&gen);
                let ids = Arc::clone(&ids);
                thread::spawn(move || {
                    let local: Vec<_> = (0..1000).map(|_| gen.generate()).collect();
                    ids.lock().unwrap().extend(local);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ids.lock().unwrap().len(), 4000, "All IDs should be unique");
    }

    #[test]
    #[should_panic(expected = "Worker ID must be < 1024")]
    fn test_generator_invalid_worker_id() {
        SnowflakeGenerator::new(1024);
    }

    #[test]
    fn test_generated_timestamp_in_window() {
        let gen = SnowflakeGenerator::new(1);
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        let id = gen.generate();
        let after = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        assert!(id.timestamp() >= before && id.timestamp() <= after);
    }
}
