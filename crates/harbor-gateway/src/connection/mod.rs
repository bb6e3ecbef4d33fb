//! Connection management
//!
//! Tracks live WebSocket connections, their subscriptions, and routing indexes.

mod connection;
mod manager;

pub use connection::Connection;
pub use manager::ConnectionManager;
