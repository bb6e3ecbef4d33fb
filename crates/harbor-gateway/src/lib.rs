//! # harbor-gateway
//!
//! WebSocket gateway for ordered real-time event delivery.

pub mod connection;
pub mod fanout;
pub mod protocol;
pub mod server;
