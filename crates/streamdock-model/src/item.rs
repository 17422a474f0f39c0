//! Downloadable items as reported by the backend's item list and queue.

use serde::{Deserialize, Serialize};

use crate::identity::{ItemIdentity, MediaId, MediaType};
use crate::wire::{null_as_default, percent};

/// Server-side lifecycle of a download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Requested but not yet admitted to the queue.
    #[default]
    Pending,
    /// Waiting in the backend queue.
    Queued,
    /// Transfer in progress.
    Downloading,
    /// File is on disk.
    Completed,
    /// Transfer gave up.
    Failed,
    /// Any status this client does not understand.
    #[serde(other)]
    Unknown,
}

impl DownloadStatus {
    /// Wire label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

/// One movie or episode known to the backend.
///
/// Series records use `season`/`episode` in the queue and `n_s`/`n_ep` in
/// the item list, and some records carry both. Either spelling decodes into
/// the same fields; the long spelling wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireItem")]
pub struct DownloadableItem {
    /// Movie id or series id.
    pub id: MediaId,
    /// Movie or episode.
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Catalog slug (hyphenated title).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Season number for episodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number for episodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Status last written by the backend.
    pub status: DownloadStatus,
    /// Transfer progress in `0..=100`.
    #[serde(rename = "progress")]
    pub progress_percent: f32,
    /// Relative file path once the download completed.
    #[serde(rename = "path", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Deserialize)]
struct WireItem {
    id: MediaId,
    #[serde(rename = "type")]
    media_type: MediaType,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    season: Option<u32>,
    #[serde(default)]
    n_s: Option<u32>,
    #[serde(default)]
    episode: Option<u32>,
    #[serde(default)]
    n_ep: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    status: DownloadStatus,
    #[serde(default, rename = "progress", deserialize_with = "percent")]
    progress_percent: f32,
    #[serde(default, rename = "path")]
    file_path: Option<String>,
}

impl From<WireItem> for DownloadableItem {
    fn from(wire: WireItem) -> Self {
        Self {
            id: wire.id,
            media_type: wire.media_type,
            slug: wire.slug,
            season: wire.season.or(wire.n_s),
            episode: wire.episode.or(wire.n_ep),
            status: wire.status,
            progress_percent: wire.progress_percent,
            file_path: wire.file_path,
        }
    }
}

impl DownloadableItem {
    /// Construct a movie record with the given status.
    #[must_use]
    pub fn movie(id: impl Into<MediaId>, status: DownloadStatus) -> Self {
        Self {
            id: id.into(),
            media_type: MediaType::Movie,
            slug: None,
            season: None,
            episode: None,
            status,
            progress_percent: 0.0,
            file_path: None,
        }
    }

    /// Construct an episode record with the given status.
    #[must_use]
    pub fn episode(
        series_id: impl Into<MediaId>,
        season: u32,
        episode: u32,
        status: DownloadStatus,
    ) -> Self {
        Self {
            id: series_id.into(),
            media_type: MediaType::Episode,
            slug: None,
            season: Some(season),
            episode: Some(episode),
            status,
            progress_percent: 0.0,
            file_path: None,
        }
    }

    /// Attach a slug.
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Attach a progress value, clamped into `0..=100`.
    #[must_use]
    pub fn with_progress(mut self, progress_percent: f32) -> Self {
        self.progress_percent = if progress_percent.is_nan() {
            0.0
        } else {
            progress_percent.clamp(0.0, 100.0)
        };
        self
    }

    /// Attach a completed file path.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Identity tuple used for cross-collection matching.
    ///
    /// Movies never carry season/episode numbers in their identity, even if
    /// the backend record has stray values.
    #[must_use]
    pub fn identity(&self) -> ItemIdentity {
        match self.media_type {
            MediaType::Movie => ItemIdentity::movie(self.id.clone()),
            MediaType::Episode => ItemIdentity {
                id: self.id.clone(),
                media_type: MediaType::Episode,
                season: self.season,
                episode: self.episode,
            },
        }
    }

    /// Human-readable title derived from the slug.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.slug.as_deref().map_or_else(
            || format!("#{}", self.id),
            |slug| slug.replace('-', " "),
        )
    }
}
