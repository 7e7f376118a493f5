//! One conditional publish attempt.
//!
//! The executor issues a single compare-and-swap publish and classifies the
//! store's answer. There is no locking anywhere in this protocol: a crashed
//! instance mid-publish leaves nothing to reap, because there was never a
//! lock, only a conditional write that either happened or did not.

use std::sync::Arc;

use tracing::trace;

use crate::item::ScheduledItem;
use crate::store::{ContentStore, PublishOutcome, StoreError};

/// Classification of a single publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// This writer won; the item is published.
    Success,
    /// Another writer already moved the revision. Terminal for this item:
    /// retrying would either be a no-op or override concurrent changes.
    Conflict,
    /// Infrastructure hiccup; the attempt may be retried.
    Transient(String),
    /// The store refused the write outright; retrying cannot help.
    Permanent(String),
}

/// Issues conditional publish writes against the content store.
pub struct PublishExecutor {
    store: Arc<dyn ContentStore>,
}

impl PublishExecutor {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Perform one conditional publish for `item`, guarded by the token read
    /// alongside it.
    pub async fn attempt(&self, item: &ScheduledItem) -> AttemptOutcome {
        trace!(
            content_id = %item.id,
            token = %item.version_token,
            "attempting conditional publish"
        );

        match self
            .store
            .conditional_publish(item.id, item.version_token)
            .await
        {
            Ok(PublishOutcome::Published) => AttemptOutcome::Success,
            Ok(PublishOutcome::VersionConflict) => AttemptOutcome::Conflict,
            Err(e @ StoreError::Unavailable(_)) => AttemptOutcome::Transient(e.to_string()),
            Err(e @ StoreError::Rejected(_)) => AttemptOutcome::Permanent(e.to_string()),
        }
    }
}
