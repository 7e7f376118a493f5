//! Fire-and-forget side effects after a successful publish.
//!
//! Both notifications run detached from the cycle: they cannot delay the next
//! item or the next tick, and they cannot roll the publish back. Each runs
//! under its own deadline, separate from the cycle's. Failures are logged and
//! swallowed; the publish already happened, so they never re-enter the
//! retry/quarantine machinery.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error};

use pressroom_events::{ContentLifecycleEvent, MessageBus, TOPIC_CONTENT_LIFECYCLE};

use crate::item::ScheduledItem;
use crate::search::SearchNotifier;

/// A supervised-but-unawaited background task.
///
/// The spawner does not join it; the task reports its own completion, failure,
/// or timeout through logging. Dropping the handle leaves the task running.
#[derive(Debug)]
pub struct DetachedTask {
    label: &'static str,
    handle: JoinHandle<()>,
}

impl DetachedTask {
    /// Spawn `fut` detached from the caller, bounded by `limit`.
    pub fn spawn<F, E>(label: &'static str, limit: Duration, fut: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: core::fmt::Display + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            match time::timeout(limit, fut).await {
                Ok(Ok(())) => debug!(task = label, "side effect completed"),
                Ok(Err(e)) => error!(task = label, error = %e, "side effect failed"),
                Err(_) => error!(task = label, limit_secs = limit.as_secs(), "side effect timed out"),
            }
        });

        Self { label, handle }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Wait for the task to finish. Only tests and drain-on-shutdown paths
    /// should need this.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

/// Emits the post-publish notifications.
pub struct SideEffectDispatcher {
    bus: Arc<dyn MessageBus>,
    search: Arc<dyn SearchNotifier>,
    timeout: Duration,
}

impl SideEffectDispatcher {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        search: Arc<dyn SearchNotifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            bus,
            search,
            timeout,
        }
    }

    /// Fire both notifications for a completed publish.
    ///
    /// Returns the detached handles; the scheduler drops them, tests may join
    /// them.
    pub fn dispatch(&self, item: &ScheduledItem) -> Vec<DetachedTask> {
        let event = ContentLifecycleEvent::published(item.owner_id, item.id, item.tags.clone());

        let bus = Arc::clone(&self.bus);
        let publish_event = DetachedTask::spawn("publish-event", self.timeout, async move {
            let payload = serde_json::to_value(&event)
                .map_err(|e| pressroom_events::BusError::Encode(e.to_string()))?;
            bus.emit(TOPIC_CONTENT_LIFECYCLE, payload).await
        });

        let search = Arc::clone(&self.search);
        let content_id = item.id;
        let slug = item.slug_or_default();
        let search_notify = DetachedTask::spawn("search-notify", self.timeout, async move {
            search.notify_published(content_id, &slug).await
        });

        vec![publish_event, search_notify]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pressroom_core::{AccountId, ContentId};
    use pressroom_events::InMemoryMessageBus;

    use crate::item::VersionToken;
    use crate::search::DisabledSearchNotifier;

    fn item_with_tags(tags: Vec<String>, slug: Option<String>) -> ScheduledItem {
        ScheduledItem {
            id: ContentId::new(),
            owner_id: AccountId::new(),
            release_at_utc: chrono::Utc::now(),
            display_timezone: None,
            version_token: VersionToken::new(1, 1),
            failed_attempts: 0,
            tags,
            slug,
        }
    }

    #[tokio::test]
    async fn dispatch_emits_lifecycle_event_with_payload() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let mut rx = bus.subscribe();

        let dispatcher = SideEffectDispatcher::new(
            bus,
            Arc::new(DisabledSearchNotifier),
            Duration::from_secs(5),
        );

        let item = item_with_tags(vec!["rust".to_string()], Some("hello".to_string()));
        for task in dispatcher.dispatch(&item) {
            task.join().await;
        }

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.topic, TOPIC_CONTENT_LIFECYCLE);
        assert_eq!(msg.payload["action"], "published");
        assert_eq!(msg.payload["status"], "published");
        assert_eq!(msg.payload["content_id"], item.id.to_string());
        assert_eq!(msg.payload["tags"][0], "rust");
    }

    #[tokio::test]
    async fn dispatch_spawns_one_task_per_side_effect() {
        let dispatcher = SideEffectDispatcher::new(
            Arc::new(InMemoryMessageBus::new()),
            Arc::new(DisabledSearchNotifier),
            Duration::from_secs(5),
        );

        let tasks = dispatcher.dispatch(&item_with_tags(Vec::new(), None));
        let labels: Vec<&str> = tasks.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["publish-event", "search-notify"]);
    }
}
