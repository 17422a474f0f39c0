//! Watchlist payloads. The watchlist lifecycle is independent of downloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::wire::lenient_timestamp;

/// A series the user is tracking for new seasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Series slug, used as the watchlist key.
    #[serde(rename = "name")]
    pub series_slug: String,
    /// Catalog URL recorded when the entry was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_url: Option<String>,
    /// When the entry was created.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub added_on: Option<DateTime<Utc>>,
    /// Number of seasons known when the entry was last updated.
    #[serde(rename = "season", default)]
    pub tracked_season_count: u32,
}

/// Body for `POST /watchlist/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewWatchlistEntry {
    /// Series slug.
    #[serde(rename = "name")]
    pub slug: String,
    /// Catalog URL; defaults to the slug.
    #[serde(rename = "url")]
    pub title_url: String,
    /// Seasons available right now.
    #[serde(rename = "season")]
    pub season_count: u32,
}

impl NewWatchlistEntry {
    /// Track `slug` with `season_count` known seasons.
    #[must_use]
    pub fn new(slug: impl Into<String>, season_count: u32) -> Self {
        let slug = slug.into();
        Self {
            title_url: slug.clone(),
            slug,
            season_count,
        }
    }

    /// Record the catalog URL the title was opened from.
    #[must_use]
    pub fn with_title_url(mut self, url: impl Into<String>) -> Self {
        self.title_url = url.into();
        self
    }

    /// Reject blank slugs or URLs before sending.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BlankField`] when the slug or URL is empty.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.slug.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "slug" });
        }
        if self.title_url.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "title_url" });
        }
        Ok(())
    }
}

/// Body for `POST /watchlist/remove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistRemoval {
    /// Series slug to drop.
    pub name: String,
}

/// Body for `POST /watchlist/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistSeasonUpdate {
    /// Catalog URL identifying the entry.
    pub url: String,
    /// New season count.
    pub season: u32,
}

/// A watched series with more seasons than recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSeasonNotice {
    /// Series slug.
    pub name: String,
    /// Catalog URL of the series.
    pub title_url: String,
    /// Season count now available.
    pub season: u32,
    /// How many seasons are new.
    #[serde(rename = "nNewSeason", default)]
    pub new_seasons: u32,
}

impl NewSeasonNotice {
    /// Update payload that records the new season count.
    #[must_use]
    pub fn to_update(&self) -> WatchlistSeasonUpdate {
        WatchlistSeasonUpdate {
            url: self.title_url.clone(),
            season: self.season,
        }
    }
}

/// Watchlist endpoints answer "nothing here" with `{"message": ...}`
/// instead of an empty array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    /// Regular array body.
    Items(Vec<T>),
    /// Informational message standing in for an empty list.
    Message {
        /// Backend-provided text.
        message: String,
    },
}

impl<T> ListBody<T> {
    /// Collapse either form into a list.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items) => items,
            Self::Message { .. } => Vec::new(),
        }
    }
}
