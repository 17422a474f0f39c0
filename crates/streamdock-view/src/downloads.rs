//! Full list-view model built from one published snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use streamdock_model::{DownloadSnapshot, DownloadableItem, ItemIdentity, MediaType};

use crate::grouping::group_episodes;
use crate::state::{ViewState, ViewStateMap, compute_view_state};

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    /// Identity tuple of the row.
    pub identity: ItemIdentity,
    /// Title derived from the slug.
    pub title: String,
    /// Stored file path for completed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Derived display state.
    pub state: ViewState,
}

impl ItemView {
    fn new(item: &DownloadableItem, state: ViewState) -> Self {
        Self {
            identity: item.identity(),
            title: item.display_title(),
            file_path: item.file_path.clone(),
            state,
        }
    }
}

/// Episodes of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeGroupView {
    /// Series slug, the group key.
    pub slug: String,
    /// Title derived from the slug.
    pub title: String,
    /// Episode rows in backend order.
    pub episodes: Vec<ItemView>,
}

/// Queue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntryView {
    /// One-based position in the backend queue.
    pub position: usize,
    /// Identity of the waiting item.
    pub identity: ItemIdentity,
    /// Title derived from the slug.
    pub title: String,
}

/// Everything a downloads page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadsView {
    /// Movie rows in backend order.
    pub movies: Vec<ItemView>,
    /// Series groups ordered by slug.
    pub series: Vec<EpisodeGroupView>,
    /// Active transfer with its live progress.
    pub current: Option<ItemView>,
    /// Waiting items in backend order.
    pub queue: Vec<QueueEntryView>,
    /// Episodes that could not be grouped.
    pub ungroupable: Vec<ItemIdentity>,
    /// When the snapshot was read.
    pub fetched_at: DateTime<Utc>,
}

impl DownloadsView {
    /// Reconcile `snapshot` into rows.
    #[must_use]
    pub fn build(snapshot: &DownloadSnapshot) -> Self {
        let states = compute_view_state(&snapshot.items, &snapshot.queue);

        let mut seen = BTreeSet::new();
        let movies = snapshot
            .items
            .iter()
            .filter(|item| item.media_type == MediaType::Movie)
            .filter(|item| seen.insert(item.identity()))
            .filter_map(|item| row(item, &states))
            .collect();

        let grouping = group_episodes(&snapshot.items);
        let series = grouping
            .groups
            .iter()
            .map(|(slug, episodes)| {
                let mut seen = BTreeSet::new();
                EpisodeGroupView {
                    slug: slug.clone(),
                    title: slug.replace('-', " "),
                    episodes: episodes
                        .iter()
                        .filter(|item| seen.insert(item.identity()))
                        .filter_map(|item| row(item, &states))
                        .collect(),
                }
            })
            .collect();

        let current = snapshot.queue.current_download.as_ref().map(|item| {
            let state = ViewState::derive(item, &item.identity(), &snapshot.queue);
            ItemView::new(item, state)
        });

        let queue = snapshot
            .queue
            .pending_queue
            .iter()
            .enumerate()
            .map(|(index, item)| QueueEntryView {
                position: index + 1,
                identity: item.identity(),
                title: item.display_title(),
            })
            .collect();

        Self {
            movies,
            series,
            current,
            queue,
            ungroupable: grouping.ungroupable,
            fetched_at: snapshot.fetched_at,
        }
    }

    /// Row for `identity`, searching movies, episodes, then the current download.
    #[must_use]
    pub fn find(&self, identity: &ItemIdentity) -> Option<&ItemView> {
        self.movies
            .iter()
            .chain(self.series.iter().flat_map(|group| group.episodes.iter()))
            .chain(self.current.iter())
            .find(|row| row.identity == *identity)
    }
}

fn row(item: &DownloadableItem, states: &ViewStateMap) -> Option<ItemView> {
    states
        .get(&item.identity())
        .map(|state| ItemView::new(item, state.clone()))
}
