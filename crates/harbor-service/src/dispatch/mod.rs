//! Push dispatch
//!
//! Background worker draining the durable push queue with at-least-once
//! semantics: an entry is marked delivered only after the transport
//! accepts it, so a crash between accept and mark re-delivers.

mod dispatcher;
mod transport;

pub use dispatcher::PushDispatcher;
pub use transport::{DispatchError, PushTransport};
