//! Typed payloads for inter-service notifications.

use serde::{Deserialize, Serialize};

use pressroom_core::{AccountId, ContentId};

/// Topic (routing key) for content lifecycle notifications.
pub const TOPIC_CONTENT_LIFECYCLE: &str = "content.lifecycle";

/// What happened to the content unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAction {
    Created,
    Edited,
    Published,
    Deleted,
}

/// Externally-visible content state after the action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
    Archived,
}

/// Inter-service message describing a content state change.
///
/// The payload carries enough for downstream consumers to act without a
/// read-back: owner, content id, what happened, and the tags used by feed and
/// category rebuilders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLifecycleEvent {
    pub account_id: AccountId,
    pub content_id: ContentId,
    pub action: ContentAction,
    pub status: ContentStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ContentLifecycleEvent {
    /// Notification for a completed publish.
    pub fn published(account_id: AccountId, content_id: ContentId, tags: Vec<String>) -> Self {
        Self {
            account_id,
            content_id,
            action: ContentAction::Published,
            status: ContentStatus::Published,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_and_status_serialize_snake_case() {
        let s = serde_json::to_string(&ContentAction::Published).unwrap();
        assert_eq!(s, "\"published\"");

        let s = serde_json::to_string(&ContentStatus::Scheduled).unwrap();
        assert_eq!(s, "\"scheduled\"");
    }

    #[test]
    fn empty_tags_are_omitted() {
        let ev = ContentLifecycleEvent::published(AccountId::new(), ContentId::new(), Vec::new());
        let v = serde_json::to_value(&ev).unwrap();
        assert!(v.get("tags").is_none());
        assert_eq!(v["action"], "published");
    }

    #[test]
    fn event_round_trips_json() {
        let ev = ContentLifecycleEvent::published(
            AccountId::new(),
            ContentId::new(),
            vec!["rust".to_string(), "backend".to_string()],
        );

        let s = serde_json::to_string(&ev).unwrap();
        let back: ContentLifecycleEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(back, ev);
    }
}
