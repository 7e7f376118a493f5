//! Integration events and the message-bus seam.
//!
//! Events published here are **notifications**, not commands: consumers (feed
//! rebuilders, caches, notification fan-out) react to state that has already
//! been persisted. Delivery is best-effort; consumers must tolerate loss and
//! duplication.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{BusError, MessageBus};
pub use event::{ContentAction, ContentLifecycleEvent, ContentStatus, TOPIC_CONTENT_LIFECYCLE};
pub use in_memory_bus::{EmittedMessage, InMemoryMessageBus};
