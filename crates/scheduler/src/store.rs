//! Storage collaborator port.
//!
//! The scheduler never talks to the search engine directly; it consumes this
//! port. Implementations own query construction, field mapping, and the
//! document store's compare-and-swap primitive. The port's contract is what
//! the whole subsystem's correctness hangs on: `conditional_publish` must
//! accept a write only while the stored revision still matches the presented
//! token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use pressroom_core::ContentId;

use crate::item::{ScheduledItem, VersionToken};

/// Result of a conditional publish the store answered.
///
/// A conflict is a normal answer, not an error: it means another writer moved
/// the revision first, which is the designed-for case of two instances racing
/// on the same due item.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The write was accepted; the item is now published.
    Published,
    /// The stored revision no longer matches the presented token.
    VersionConflict,
}

/// Infrastructure failure from the storage collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached or answered with an infrastructure
    /// fault. Eligible for retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store understood the request and refused it (unknown id, mapping
    /// or validation failure). Retrying cannot change the answer.
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Storage port consumed by the deferred-publish scheduler.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Items whose release instant has passed, capped at `limit`.
    ///
    /// Selection predicate: `release_at_utc <= now`, `failed_attempts <
    /// quarantine_threshold`, not archived, and still awaiting publish.
    /// Ordered by ascending release time so a backlog drains oldest first.
    /// Each returned item carries the version token from this same read.
    async fn due_items(
        &self,
        now: DateTime<Utc>,
        quarantine_threshold: u32,
        limit: usize,
    ) -> Result<Vec<ScheduledItem>, StoreError>;

    /// Move one item from scheduled to published, guarded by `token`.
    ///
    /// On acceptance the persisted release time becomes the actual publish
    /// instant.
    async fn conditional_publish(
        &self,
        id: ContentId,
        token: VersionToken,
    ) -> Result<PublishOutcome, StoreError>;

    /// Record one terminal publish failure for quarantine bookkeeping.
    ///
    /// The counter is monotonic across cycles; once it reaches the quarantine
    /// threshold, `due_items` stops returning the item.
    async fn record_publish_failure(&self, id: ContentId, reason: &str) -> Result<(), StoreError>;
}
