//! Series grouping for episode lists.

use std::collections::BTreeMap;

use serde::Serialize;
use streamdock_model::{DownloadableItem, ItemIdentity, MediaType};

/// Episodes bucketed by series slug.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeGrouping {
    /// Episodes per slug, in the order the backend listed them.
    pub groups: BTreeMap<String, Vec<DownloadableItem>>,
    /// Episodes without a usable slug.
    pub ungroupable: Vec<ItemIdentity>,
}

/// Group TV episodes by slug.
///
/// The slug is used verbatim as the key, so `the-show` and `The-Show` are
/// different series. Movies are skipped. An absent or empty slug makes the
/// episode ungroupable.
#[must_use]
pub fn group_episodes(items: &[DownloadableItem]) -> EpisodeGrouping {
    let mut grouping = EpisodeGrouping::default();
    for item in items
        .iter()
        .filter(|item| item.media_type == MediaType::Episode)
    {
        match item.slug.as_deref().filter(|slug| !slug.is_empty()) {
            Some(slug) => grouping
                .groups
                .entry(slug.to_string())
                .or_default()
                .push(item.clone()),
            None => grouping.ungroupable.push(item.identity()),
        }
    }
    grouping
}
