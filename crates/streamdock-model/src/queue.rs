//! Queue snapshots and the combined result of one poll cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::ItemIdentity;
use crate::item::DownloadableItem;
use crate::wire::null_as_default;

/// Point-in-time read of the backend scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Item currently being transferred, with fresh progress.
    #[serde(default)]
    pub current_download: Option<DownloadableItem>,
    /// Items waiting to be transferred, in backend order.
    #[serde(rename = "queue", default, deserialize_with = "null_as_default")]
    pub pending_queue: Vec<DownloadableItem>,
}

impl QueueSnapshot {
    /// Whether `identity` is the item currently downloading.
    #[must_use]
    pub fn is_current(&self, identity: &ItemIdentity) -> bool {
        self.current_download
            .as_ref()
            .is_some_and(|current| current.identity() == *identity)
    }

    /// Zero-based queue position of `identity`, if it is waiting.
    #[must_use]
    pub fn queue_position(&self, identity: &ItemIdentity) -> Option<usize> {
        self.pending_queue
            .iter()
            .position(|queued| queued.identity() == *identity)
    }

    /// Number of items waiting behind the current download.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.pending_queue.len()
    }
}

/// Result of one successful poll cycle: both collections read together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSnapshot {
    /// Every item known to the backend.
    pub items: Vec<DownloadableItem>,
    /// Scheduler state at the time of the read.
    pub queue: QueueSnapshot,
    /// When the cycle completed.
    pub fetched_at: DateTime<Utc>,
}

impl DownloadSnapshot {
    /// Bundle both halves of a cycle, stamping the completion time.
    #[must_use]
    pub fn new(items: Vec<DownloadableItem>, queue: QueueSnapshot) -> Self {
        Self {
            items,
            queue,
            fetched_at: Utc::now(),
        }
    }

    /// Whether any transfer is running.
    #[must_use]
    pub const fn has_active_download(&self) -> bool {
        self.queue.current_download.is_some()
    }

    /// Look up an item by identity.
    #[must_use]
    pub fn find(&self, identity: &ItemIdentity) -> Option<&DownloadableItem> {
        self.items.iter().find(|item| item.identity() == *identity)
    }
}
