//! Enqueue requests and the backend's answers to them.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::identity::ItemIdentity;
use crate::item::DownloadStatus;

/// Ask the backend to download one movie or episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// What to download.
    pub identity: ItemIdentity,
    /// Catalog slug the backend resolves the title with.
    pub slug: String,
}

impl EnqueueRequest {
    /// Pair an identity with its catalog slug.
    #[must_use]
    pub fn new(identity: ItemIdentity, slug: impl Into<String>) -> Self {
        Self {
            identity,
            slug: slug.into(),
        }
    }

    /// Check the request before it reaches the duplicate guard.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a malformed identity or blank slug.
    pub fn validate(&self) -> ValidationResult<()> {
        self.identity.validate()?;
        if self.slug.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "slug" });
        }
        Ok(())
    }
}

/// Answer of the movie and episode enqueue endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnqueueStatus {
    /// Accepted and waiting.
    Queued,
    /// Already transferring.
    Downloading,
    /// Already on disk.
    Completed {
        /// Stored file path, when the backend found it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    /// Refused by the backend.
    Error {
        /// Backend explanation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// A status label this client does not know.
    #[serde(other)]
    Unknown,
}

impl EnqueueStatus {
    /// Short label for rendering.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// Per-episode result of a season enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEnqueueStatus {
    /// Episode number within the season.
    pub episode: u32,
    /// Status after the request: `queued` for new rows, otherwise the
    /// status of the existing row.
    pub status: DownloadStatus,
}

/// Answer of the season enqueue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonEnqueueReport {
    /// Overall status label.
    pub status: String,
    /// Every episode the backend considered.
    #[serde(default)]
    pub episodes: Vec<EpisodeEnqueueStatus>,
}

impl SeasonEnqueueReport {
    /// Episodes that were newly queued by this request.
    #[must_use]
    pub fn newly_queued(&self) -> usize {
        self.episodes
            .iter()
            .filter(|episode| episode.status == DownloadStatus::Queued)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enqueue_status_decodes_each_backend_answer() {
        let queued: EnqueueStatus =
            serde_json::from_value(json!({"status": "queued"})).expect("queued");
        assert_eq!(queued, EnqueueStatus::Queued);

        let done: EnqueueStatus =
            serde_json::from_value(json!({"status": "completed", "path": "Film/film.mp4"}))
                .expect("completed");
        assert_eq!(
            done,
            EnqueueStatus::Completed {
                path: Some("Film/film.mp4".into())
            }
        );

        let error: EnqueueStatus = serde_json::from_value(
            json!({"status": "error", "detail": "Path not found for completed download"}),
        )
        .expect("error");
        assert_eq!(error.label(), "error");

        let other: EnqueueStatus =
            serde_json::from_value(json!({"status": "paused"})).expect("unknown");
        assert_eq!(other, EnqueueStatus::Unknown);
    }

    #[test]
    fn season_report_counts_new_rows() {
        let report: SeasonEnqueueReport = serde_json::from_value(json!({
            "status": "queued",
            "episodes": [
                {"episode": 1, "status": "completed"},
                {"episode": 2, "status": "queued"},
                {"episode": 3, "status": "queued"}
            ]
        }))
        .expect("decode report");
        assert_eq!(report.newly_queued(), 2);
    }

    #[test]
    fn request_requires_slug_and_valid_identity() {
        let request = EnqueueRequest::new(ItemIdentity::movie("m1"), "");
        assert_eq!(
            request.validate(),
            Err(ValidationError::BlankField { field: "slug" })
        );

        let request = EnqueueRequest::new(ItemIdentity::episode(3_u64, 0, 1), "show");
        assert_eq!(
            request.validate(),
            Err(ValidationError::ZeroNumber { field: "season" })
        );
    }
}
