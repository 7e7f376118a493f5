//! The unit of scheduled work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pressroom_core::{AccountId, ContentId};

/// Optimistic-concurrency stamp identifying one stored revision.
///
/// A conditional write must present the token it last read; the store accepts
/// the write only while the stored revision still carries the same stamp.
/// The pair (sequence number, primary term) is the document-store convention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken {
    pub seq_no: u64,
    pub primary_term: u64,
}

impl VersionToken {
    pub fn new(seq_no: u64, primary_term: u64) -> Self {
        Self {
            seq_no,
            primary_term,
        }
    }
}

impl core::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "seq={}/term={}", self.seq_no, self.primary_term)
    }
}

/// A content unit waiting for its release instant.
///
/// Produced by [`crate::store::ContentStore::due_items`]; the `version_token`
/// comes from the same read that selected the item, so the conditional publish
/// is guarded against every write that happened since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub id: ContentId,
    pub owner_id: AccountId,

    /// Release instant. Always stored and compared in UTC.
    pub release_at_utc: DateTime<Utc>,

    /// Timezone the author scheduled in. Display only, never compared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_timezone: Option<String>,

    /// Revision stamp from the read that selected this item as due.
    pub version_token: VersionToken,

    /// Terminal publish failures accumulated across polling cycles.
    pub failed_attempts: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl ScheduledItem {
    /// True once the release instant has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.release_at_utc <= now
    }

    /// Slug for outbound notifications, derived from the id when the author
    /// never set one.
    pub fn slug_or_default(&self) -> String {
        match self.slug.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("post-{}", self.id),
        }
    }
}
