//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod auth;
pub mod channels;
pub mod guilds;
pub mod health;
pub mod invites;
pub mod members;
pub mod messages;
pub mod reactions;
pub mod roles;
