//! Domain events emitted after committed mutations

mod domain_event;

pub use domain_event::{DomainEvent, EventRoute};
