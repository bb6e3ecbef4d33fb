//! Integration test utilities
//!
//! Helpers for wiring a full service stack over the in-memory store,
//! with either a null event sink or the real gateway fan-out dispatcher.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
