//! In-memory message bus for tests/dev.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::bus::{BusError, MessageBus};

/// A message as observed by an in-memory subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// In-memory fan-out bus.
///
/// - No IO
/// - Best-effort broadcast; dead subscribers are dropped on the next emit
/// - Unbounded buffering (fine for tests, not a production transport)
#[derive(Debug, Default)]
pub struct InMemoryMessageBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<EmittedMessage>>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber that receives a copy of every subsequent emit.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<EmittedMessage> {
        let (tx, rx) = mpsc::unbounded_channel();

        // If the lock is poisoned we still hand back a receiver; it just never
        // sees messages until the process restarts.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }

        rx
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn emit(&self, topic: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let message = EmittedMessage {
            topic: topic.to_string(),
            payload,
        };

        let mut subs = self
            .subscribers
            .lock()
            .map_err(|_| BusError::Unavailable("subscriber lock poisoned".to_string()))?;

        // Drop any dead subscribers while publishing.
        subs.retain(|tx| tx.send(message.clone()).is_ok());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_fans_out_to_all_subscribers() {
        let bus = InMemoryMessageBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit("content.lifecycle", serde_json::json!({"n": 1}))
            .await
            .unwrap();

        let got_a = a.recv().await.unwrap();
        let got_b = b.recv().await.unwrap();
        assert_eq!(got_a, got_b);
        assert_eq!(got_a.topic, "content.lifecycle");
    }

    #[tokio::test]
    async fn dead_subscribers_are_pruned() {
        let bus = InMemoryMessageBus::new();
        let rx = bus.subscribe();
        drop(rx);

        let mut live = bus.subscribe();
        bus.emit("content.lifecycle", serde_json::json!({}))
            .await
            .unwrap();

        assert!(live.recv().await.is_some());
        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
    }
}
