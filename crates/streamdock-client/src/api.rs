//! Backend seam shared by the HTTP client and in-process fakes.

use async_trait::async_trait;
use streamdock_model::{
    DownloadableItem, EnqueueStatus, MediaId, NewSeasonNotice, NewWatchlistEntry, QueueSnapshot,
    SeasonEnqueueReport, WatchlistEntry, WatchlistRemoval, WatchlistSeasonUpdate,
};

use crate::error::ApiResult;

/// Operations the poller and dispatcher need from the download backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Every known downloadable item, in server order.
    async fn list_items(&self) -> ApiResult<Vec<DownloadableItem>>;

    /// Current download and pending queue.
    async fn queue_status(&self) -> ApiResult<QueueSnapshot>;

    /// Remove a downloaded movie.
    async fn delete_movie(&self, id: &MediaId) -> ApiResult<()>;

    /// Remove a downloaded episode.
    async fn delete_episode(&self, series_id: &MediaId, season: u32, episode: u32)
    -> ApiResult<()>;

    /// Request a movie download.
    async fn enqueue_movie(&self, id: &MediaId, slug: &str) -> ApiResult<EnqueueStatus>;

    /// Request a single episode download.
    async fn enqueue_episode(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
        slug: &str,
    ) -> ApiResult<EnqueueStatus>;

    /// Request every episode of a season.
    async fn enqueue_season(
        &self,
        series_id: &MediaId,
        season: u32,
        slug: &str,
    ) -> ApiResult<SeasonEnqueueReport>;

    /// Tracked series.
    async fn watchlist(&self) -> ApiResult<Vec<WatchlistEntry>>;

    /// Start tracking a series.
    async fn add_watchlist(&self, entry: &NewWatchlistEntry) -> ApiResult<()>;

    /// Record a new tracked season count.
    async fn update_watchlist(&self, update: &WatchlistSeasonUpdate) -> ApiResult<()>;

    /// Stop tracking a series.
    async fn remove_watchlist(&self, removal: &WatchlistRemoval) -> ApiResult<()>;

    /// Series whose upstream season count grew since they were tracked.
    async fn check_new_seasons(&self) -> ApiResult<Vec<NewSeasonNotice>>;

    /// Stored file path of a downloaded movie.
    async fn movie_path(&self, id: &MediaId) -> ApiResult<String>;

    /// Stored file path of a downloaded episode.
    async fn episode_path(&self, series_id: &MediaId, season: u32, episode: u32)
    -> ApiResult<String>;
}
