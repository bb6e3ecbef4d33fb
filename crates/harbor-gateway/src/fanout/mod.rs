//! Ordered event fan-out

mod dispatcher;

pub use dispatcher::FanoutDispatcher;
