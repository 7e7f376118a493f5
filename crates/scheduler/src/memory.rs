//! In-memory content store for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pressroom_core::ContentId;

use crate::item::{ScheduledItem, VersionToken};
use crate::store::{ContentStore, PublishOutcome, StoreError};

#[derive(Debug, Clone)]
struct StoredContent {
    item: ScheduledItem,
    published: bool,
    archived: bool,
    last_failure: Option<String>,
}

/// In-memory store with real compare-and-swap semantics.
///
/// Intended for tests/dev. Every accepted write bumps the sequence number, so
/// a token read before any other write is stale afterwards, matching the
/// observable behavior of the production document store.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    records: RwLock<HashMap<ContentId, StoredContent>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a scheduled item awaiting publish. The item's own token becomes
    /// the stored revision stamp.
    pub fn insert_scheduled(&self, item: ScheduledItem) {
        let mut records = self.records.write().unwrap();
        records.insert(
            item.id,
            StoredContent {
                item,
                published: false,
                archived: false,
                last_failure: None,
            },
        );
    }

    /// Mark an item archived (excluded from the due set).
    pub fn archive(&self, id: ContentId) {
        if let Some(rec) = self.records.write().unwrap().get_mut(&id) {
            rec.archived = true;
            rec.item.version_token.seq_no += 1;
        }
    }

    pub fn is_published(&self, id: ContentId) -> bool {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.published)
            .unwrap_or(false)
    }

    pub fn failed_attempts(&self, id: ContentId) -> Option<u32> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.item.failed_attempts)
    }

    pub fn last_failure(&self, id: ContentId) -> Option<String> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .and_then(|r| r.last_failure.clone())
    }

    /// Persisted release instant (becomes the publish instant once published).
    pub fn release_at(&self, id: ContentId) -> Option<DateTime<Utc>> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.item.release_at_utc)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn due_items(
        &self,
        now: DateTime<Utc>,
        quarantine_threshold: u32,
        limit: usize,
    ) -> Result<Vec<ScheduledItem>, StoreError> {
        let records = self.records.read().unwrap();

        let mut due: Vec<ScheduledItem> = records
            .values()
            .filter(|rec| {
                !rec.published
                    && !rec.archived
                    && rec.item.release_at_utc <= now
                    && rec.item.failed_attempts < quarantine_threshold
            })
            .map(|rec| rec.item.clone())
            .collect();

        due.sort_by_key(|item| item.release_at_utc);
        due.truncate(limit);
        Ok(due)
    }

    async fn conditional_publish(
        &self,
        id: ContentId,
        token: VersionToken,
    ) -> Result<PublishOutcome, StoreError> {
        let mut records = self.records.write().unwrap();

        let rec = records
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("unknown content id {id}")))?;

        if rec.item.version_token != token {
            return Ok(PublishOutcome::VersionConflict);
        }

        rec.published = true;
        rec.item.release_at_utc = Utc::now();
        rec.item.version_token.seq_no += 1;
        Ok(PublishOutcome::Published)
    }

    async fn record_publish_failure(&self, id: ContentId, reason: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap();

        let rec = records
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("unknown content id {id}")))?;

        rec.item.failed_attempts += 1;
        rec.last_failure = Some(reason.to_string());
        rec.item.version_token.seq_no += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use pressroom_core::AccountId;

    fn scheduled(release_offset_secs: i64) -> ScheduledItem {
        ScheduledItem {
            id: ContentId::new(),
            owner_id: AccountId::new(),
            release_at_utc: Utc::now() + Duration::seconds(release_offset_secs),
            display_timezone: None,
            version_token: VersionToken::new(1, 1),
            failed_attempts: 0,
            tags: Vec::new(),
            slug: None,
        }
    }

    #[tokio::test]
    async fn due_items_filters_and_orders_by_release_time() {
        let store = InMemoryContentStore::new();

        let oldest = scheduled(-300);
        let newer = scheduled(-30);
        let future = scheduled(300);
        store.insert_scheduled(newer.clone());
        store.insert_scheduled(oldest.clone());
        store.insert_scheduled(future);

        let due = store.due_items(Utc::now(), 5, 100).await.unwrap();
        let ids: Vec<ContentId> = due.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![oldest.id, newer.id]);
    }

    #[tokio::test]
    async fn due_items_respects_batch_limit() {
        let store = InMemoryContentStore::new();
        for _ in 0..4 {
            store.insert_scheduled(scheduled(-60));
        }

        let due = store.due_items(Utc::now(), 5, 2).await.unwrap();
        assert_eq!(due.len(), 2);
    }

    #[tokio::test]
    async fn stale_token_loses_the_publish_race() {
        let store = InMemoryContentStore::new();
        let item = scheduled(-60);
        store.insert_scheduled(item.clone());

        let first = store
            .conditional_publish(item.id, item.version_token)
            .await
            .unwrap();
        assert_eq!(first, PublishOutcome::Published);

        // Same token presented again: the revision moved, the write loses.
        let second = store
            .conditional_publish(item.id, item.version_token)
            .await
            .unwrap();
        assert_eq!(second, PublishOutcome::VersionConflict);
    }

    #[tokio::test]
    async fn published_items_leave_the_due_set() {
        let store = InMemoryContentStore::new();
        let item = scheduled(-60);
        store.insert_scheduled(item.clone());

        store
            .conditional_publish(item.id, item.version_token)
            .await
            .unwrap();

        let due = store.due_items(Utc::now(), 5, 100).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn archived_items_are_excluded() {
        let store = InMemoryContentStore::new();
        let item = scheduled(-60);
        store.insert_scheduled(item.clone());
        store.archive(item.id);

        let due = store.due_items(Utc::now(), 5, 100).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn failure_counter_quarantines_at_threshold() {
        let store = InMemoryContentStore::new();
        let item = scheduled(-60);
        store.insert_scheduled(item.clone());

        for _ in 0..5 {
            store
                .record_publish_failure(item.id, "store unavailable")
                .await
                .unwrap();
        }

        assert_eq!(store.failed_attempts(item.id), Some(5));
        assert_eq!(
            store.last_failure(item.id).as_deref(),
            Some("store unavailable")
        );

        // Still past due, but the quarantine predicate excludes it.
        let due = store.due_items(Utc::now(), 5, 100).await.unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn failure_increment_invalidates_previously_read_tokens() {
        let store = InMemoryContentStore::new();
        let item = scheduled(-60);
        store.insert_scheduled(item.clone());

        store
            .record_publish_failure(item.id, "transient")
            .await
            .unwrap();

        let outcome = store
            .conditional_publish(item.id, item.version_token)
            .await
            .unwrap();
        assert_eq!(outcome, PublishOutcome::VersionConflict);
    }
}
