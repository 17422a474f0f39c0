//! Per-item badge, progress, and action derivation.

use std::collections::BTreeMap;

use serde::Serialize;
use streamdock_model::{DownloadStatus, DownloadableItem, ItemIdentity, QueueSnapshot};

use crate::stream::stream_path;

/// Status badge shown next to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    /// Matches the backend's current download.
    Downloading,
    /// Waiting in the backend queue.
    Queued,
    /// File is available.
    Completed,
    /// Backend gave up on the transfer.
    Failed,
}

impl BadgeKind {
    /// Label rendered inside the badge.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Queued => "queued",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// The one action a view offers for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Open the file at the given relative stream location.
    Play {
        /// Location under the server prefix, see [`stream_path`].
        stream_path: String,
    },
    /// Queue the item again after a failure.
    Retry,
    /// Queue the item for the first time.
    Enqueue,
    /// Nothing to do while the backend is busy with the item.
    None,
}

/// Derived display state for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    /// Badge kind, absent when the item has no notable state.
    pub badge: Option<BadgeKind>,
    /// Badge text; empty without a badge.
    pub badge_text: String,
    /// Progress percentage; the bar is visible iff this is set.
    pub progress: Option<f32>,
    /// Action offered for the item.
    pub primary_action: PrimaryAction,
}

impl ViewState {
    /// Whether the progress bar should be drawn.
    #[must_use]
    pub const fn progress_visible(&self) -> bool {
        self.progress.is_some()
    }

    pub(crate) fn derive(
        item: &DownloadableItem,
        identity: &ItemIdentity,
        queue: &QueueSnapshot,
    ) -> Self {
        if let Some(current) = queue
            .current_download
            .as_ref()
            .filter(|current| current.identity() == *identity)
        {
            let progress = current.progress_percent;
            return Self {
                badge: Some(BadgeKind::Downloading),
                badge_text: format!("{} {progress:.0}%", BadgeKind::Downloading.label()),
                progress: Some(progress),
                primary_action: PrimaryAction::None,
            };
        }

        if queue.queue_position(identity).is_some() {
            return Self::badged(BadgeKind::Queued, PrimaryAction::None);
        }

        match item.status {
            DownloadStatus::Completed => {
                let action = item
                    .file_path
                    .as_deref()
                    .and_then(stream_path)
                    .map_or(PrimaryAction::None, |stream_path| PrimaryAction::Play {
                        stream_path,
                    });
                Self::badged(BadgeKind::Completed, action)
            }
            DownloadStatus::Failed => Self::badged(BadgeKind::Failed, PrimaryAction::Retry),
            // The backend already owns these; the queue has not caught up yet.
            DownloadStatus::Queued | DownloadStatus::Downloading => {
                Self::unbadged(PrimaryAction::None)
            }
            DownloadStatus::Pending | DownloadStatus::Unknown => {
                Self::unbadged(PrimaryAction::Enqueue)
            }
        }
    }

    fn unbadged(primary_action: PrimaryAction) -> Self {
        Self {
            badge: None,
            badge_text: String::new(),
            progress: None,
            primary_action,
        }
    }

    fn badged(kind: BadgeKind, primary_action: PrimaryAction) -> Self {
        Self {
            badge: Some(kind),
            badge_text: kind.label().to_string(),
            progress: None,
            primary_action,
        }
    }
}

/// View states keyed by identity, in identity order.
pub type ViewStateMap = BTreeMap<ItemIdentity, ViewState>;

/// Derive the display state of every item from one snapshot.
///
/// Precedence is fixed: a match on the current download wins over queue
/// membership, which wins over the item's own status. An item whose own
/// status says `queued` or `downloading` but that appears in neither queue
/// collection gets no badge, since the queue snapshot is the fresher source,
/// and no enqueue action either, since the backend already holds it.
///
/// When the list carries the same identity twice, the first record decides.
#[must_use]
pub fn compute_view_state(items: &[DownloadableItem], queue: &QueueSnapshot) -> ViewStateMap {
    let mut states = ViewStateMap::new();
    for item in items {
        let identity = item.identity();
        if states.contains_key(&identity) {
            continue;
        }
        let state = ViewState::derive(item, &identity, queue);
        states.insert(identity, state);
    }
    states
}
