//! Indexing/SEO notification port.
//!
//! Best-effort only: a publish is complete whether or not the indexing
//! pipeline hears about it, and a missed notification is repaired by the next
//! full reindex.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use pressroom_core::ContentId;

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("search notification failed: {0}")]
    Failed(String),
}

/// Tells the indexing/SEO pipeline that content went live under a slug.
#[async_trait]
pub trait SearchNotifier: Send + Sync {
    async fn notify_published(&self, content_id: ContentId, slug: &str) -> Result<(), NotifyError>;
}

/// Notifier used when SEO integration is disabled by configuration.
#[derive(Debug, Default)]
pub struct DisabledSearchNotifier;

#[async_trait]
impl SearchNotifier for DisabledSearchNotifier {
    async fn notify_published(&self, content_id: ContentId, slug: &str) -> Result<(), NotifyError> {
        debug!(%content_id, slug, "search notifications disabled; skipping");
        Ok(())
    }
}
