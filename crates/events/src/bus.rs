//! Message-bus abstraction (mechanics only).
//!
//! The bus is the **transport seam** between the platform and its broker
//! (RabbitMQ, NATS, an in-memory channel in tests). It makes minimal
//! assumptions:
//!
//! - **Transport-agnostic**: implementations decide exchanges, routing, wire
//!   encoding.
//! - **At-least-once at best**: a returned `Ok` means the broker accepted the
//!   message, not that any consumer processed it.
//! - **No persistence**: the stored content state is the source of truth; a
//!   lost notification is recoverable by re-reading the store.
//!
//! Callers that emit after a completed state change (the publish scheduler in
//! particular) treat failures as log-and-continue: the mutation already
//! happened and must not be rolled back over a notification.

use async_trait::async_trait;
use thiserror::Error;

/// Error surfaced by a bus implementation.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The broker could not be reached or refused the message.
    #[error("message bus unavailable: {0}")]
    Unavailable(String),

    /// The payload could not be encoded for the wire.
    #[error("payload encoding failed: {0}")]
    Encode(String),
}

/// Outbound message-bus port.
///
/// `emit` publishes one message to a topic. Implementations must be safe to
/// call concurrently from multiple tasks.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn emit(&self, topic: &str, payload: serde_json::Value) -> Result<(), BusError>;
}
