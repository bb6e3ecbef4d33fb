//! Application configuration structs
//!
//! Loads configuration from environment variables, with a `.env` file
//! honored when present.

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway_server: ServerConfig,
    pub session: SessionConfig,
    pub gateway: GatewayConfig,
    pub push: PushConfig,
    pub snowflake: SnowflakeConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Bind address (for both the API and the gateway listener)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Session token lifetime
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
}

/// Gateway windows and queue sizes
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Seconds a socket may stay unauthenticated before it is closed
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    /// Interval of the sweep that drops stale or revoked connections
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Per-connection outbound queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Push dispatcher cadence and backoff
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_tick_secs")]
    pub tick_secs: u64,
    #[serde(default = "default_push_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_push_base_backoff_secs")]
    pub base_backoff_secs: u64,
    #[serde(default = "default_push_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Seconds granted to a single transport delivery
    #[serde(default = "default_push_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

// Default value functions
fn default_app_name() -> String {
    "harbor".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_token_ttl_days() -> i64 {
    30
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

fn default_heartbeat_interval_secs() -> u64 {
    45
}

fn default_queue_capacity() -> usize {
    256
}

fn default_push_tick_secs() -> u64 {
    5
}

fn default_push_batch_size() -> usize {
    64
}

fn default_push_base_backoff_secs() -> u64 {
    2
}

fn default_push_max_backoff_secs() -> u64 {
    300
}

fn default_push_delivery_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present; absence is not an error
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("API_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            gateway_server: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            session: SessionConfig {
                token_ttl_days: env_or("SESSION_TOKEN_TTL_DAYS", default_token_ttl_days),
            },
            gateway: GatewayConfig {
                handshake_timeout_secs: env_or(
                    "GATEWAY_HANDSHAKE_TIMEOUT_SECS",
                    default_handshake_timeout_secs,
                ),
                heartbeat_interval_secs: env_or(
                    "GATEWAY_HEARTBEAT_INTERVAL_SECS",
                    default_heartbeat_interval_secs,
                ),
                queue_capacity: env_or("GATEWAY_QUEUE_CAPACITY", default_queue_capacity),
            },
            push: PushConfig {
                tick_secs: env_or("PUSH_TICK_SECS", default_push_tick_secs),
                batch_size: env_or("PUSH_BATCH_SIZE", default_push_batch_size),
                base_backoff_secs: env_or("PUSH_BASE_BACKOFF_SECS", default_push_base_backoff_secs),
                max_backoff_secs: env_or("PUSH_MAX_BACKOFF_SECS", default_push_max_backoff_secs),
                delivery_timeout_secs: env_or(
                    "PUSH_DELIVERY_TIMEOUT_SECS",
                    default_push_delivery_timeout_secs,
                ),
            },
            snowflake: SnowflakeConfig {
                worker_id: env::var("WORKER_ID")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0),
            },
        })
    }
}

fn env_or<T: std::str::FromStr>(var: &str, default: fn() -> T) -> T {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_predicates() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
        assert!(Environment::Development.is_development());
        assert!(!Environment::Staging.is_development());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_token_ttl_days(), 30);
        assert_eq!(default_handshake_timeout_secs(), 10);
        assert_eq!(default_queue_capacity(), 256);
        assert_eq!(default_push_max_backoff_secs(), 300);
    }
}
