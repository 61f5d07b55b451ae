//! Change events
//!
//! Committed mutations are announced on the message bus so other services can
//! maintain their own projections.

pub mod bus;
pub mod nats;
mod publisher;

pub use bus::{BusError, MessageBus};
pub use nats::NatsMessageBus;
pub use publisher::EventPublisher;
