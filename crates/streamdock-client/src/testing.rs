//! In-memory backend for poller and dispatcher tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use streamdock_model::{
    DownloadStatus, DownloadableItem, EnqueueStatus, EpisodeEnqueueStatus, ItemIdentity,
    MediaId, NewSeasonNotice, NewWatchlistEntry, QueueSnapshot, SeasonEnqueueReport,
    WatchlistEntry, WatchlistRemoval, WatchlistSeasonUpdate,
};
use tokio::sync::watch;

use crate::api::BackendApi;
use crate::error::{ApiError, ApiResult};

/// Scripted backend: state lives in memory, failures are queued per call
/// site, and gates can hold fetches or actions mid-request.
pub(crate) struct ScriptedBackend {
    items: Mutex<Vec<DownloadableItem>>,
    queue: Mutex<QueueSnapshot>,
    watchlist: Mutex<Vec<WatchlistEntry>>,
    notices: Mutex<Vec<NewSeasonNotice>>,
    updates: Mutex<Vec<WatchlistSeasonUpdate>>,
    list_failures: Mutex<VecDeque<ApiError>>,
    queue_failures: Mutex<VecDeque<ApiError>>,
    action_failures: Mutex<VecDeque<ApiError>>,
    fetch_gate: watch::Sender<bool>,
    action_gate: watch::Sender<bool>,
    list_calls: AtomicUsize,
    queue_calls: AtomicUsize,
    action_calls: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::with_items(Vec::new())
    }
}

impl ScriptedBackend {
    pub(crate) fn with_items(items: Vec<DownloadableItem>) -> Self {
        Self {
            items: Mutex::new(items),
            queue: Mutex::new(QueueSnapshot::default()),
            watchlist: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            list_failures: Mutex::new(VecDeque::new()),
            queue_failures: Mutex::new(VecDeque::new()),
            action_failures: Mutex::new(VecDeque::new()),
            fetch_gate: watch::Sender::new(true),
            action_gate: watch::Sender::new(true),
            list_calls: AtomicUsize::new(0),
            queue_calls: AtomicUsize::new(0),
            action_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_items(&self, items: Vec<DownloadableItem>) {
        *lock(&self.items) = items;
    }

    pub(crate) fn set_queue(&self, queue: QueueSnapshot) {
        *lock(&self.queue) = queue;
    }

    pub(crate) fn set_notices(&self, notices: Vec<NewSeasonNotice>) {
        *lock(&self.notices) = notices;
    }

    pub(crate) fn applied_updates(&self) -> Vec<WatchlistSeasonUpdate> {
        lock(&self.updates).clone()
    }

    pub(crate) fn tracked(&self) -> Vec<String> {
        lock(&self.watchlist)
            .iter()
            .map(|entry| entry.series_slug.clone())
            .collect()
    }

    pub(crate) fn hold_fetches(&self) {
        self.fetch_gate.send_replace(false);
    }

    pub(crate) fn release_fetches(&self) {
        self.fetch_gate.send_replace(true);
    }

    pub(crate) fn hold_actions(&self) {
        self.action_gate.send_replace(false);
    }

    pub(crate) fn release_actions(&self) {
        self.action_gate.send_replace(true);
    }

    pub(crate) fn fail_next_list(&self, err: ApiError) {
        lock(&self.list_failures).push_back(err);
    }

    pub(crate) fn fail_next_queue(&self, err: ApiError) {
        lock(&self.queue_failures).push_back(err);
    }

    pub(crate) fn fail_next_action(&self, err: ApiError) {
        lock(&self.action_failures).push_back(err);
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn queue_calls(&self) -> usize {
        self.queue_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn action_calls(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }

    async fn begin_action(&self) -> ApiResult<()> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.action_gate).await;
        match lock(&self.action_failures).pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn remove_item(&self, identity: &ItemIdentity, endpoint: &str) -> ApiResult<()> {
        let mut items = lock(&self.items);
        let before = items.len();
        items.retain(|item| item.identity() != *identity);
        if items.len() == before {
            return Err(not_found(endpoint));
        }
        Ok(())
    }

    fn push_queued(&self, item: DownloadableItem) {
        lock(&self.queue).pending_queue.push(item);
    }
}

async fn pass(gate: &watch::Sender<bool>) {
    let mut open = gate.subscribe();
    loop {
        let is_open = *open.borrow_and_update();
        if is_open || open.changed().await.is_err() {
            return;
        }
    }
}

fn not_found(endpoint: &str) -> ApiError {
    ApiError::NotFound {
        endpoint: endpoint.to_string(),
        message: "not found".to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl BackendApi for ScriptedBackend {
    async fn list_items(&self) -> ApiResult<Vec<DownloadableItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Answer with the state at request time, like a real server.
        let items = lock(&self.items).clone();
        pass(&self.fetch_gate).await;
        if let Some(err) = lock(&self.list_failures).pop_front() {
            return Err(err);
        }
        Ok(items)
    }

    async fn queue_status(&self) -> ApiResult<QueueSnapshot> {
        self.queue_calls.fetch_add(1, Ordering::SeqCst);
        let queue = lock(&self.queue).clone();
        pass(&self.fetch_gate).await;
        if let Some(err) = lock(&self.queue_failures).pop_front() {
            return Err(err);
        }
        Ok(queue)
    }

    async fn delete_movie(&self, id: &MediaId) -> ApiResult<()> {
        self.begin_action().await?;
        self.remove_item(&ItemIdentity::movie(id.clone()), "/server/delete/movie")
    }

    async fn delete_episode(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
    ) -> ApiResult<()> {
        self.begin_action().await?;
        self.remove_item(
            &ItemIdentity::episode(series_id.clone(), season, episode),
            "/server/delete/episode",
        )
    }

    async fn enqueue_movie(&self, id: &MediaId, slug: &str) -> ApiResult<EnqueueStatus> {
        self.begin_action().await?;
        self.push_queued(DownloadableItem::movie(id.clone(), DownloadStatus::Queued).with_slug(slug));
        Ok(EnqueueStatus::Queued)
    }

    async fn enqueue_episode(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
        slug: &str,
    ) -> ApiResult<EnqueueStatus> {
        self.begin_action().await?;
        self.push_queued(
            DownloadableItem::episode(series_id.clone(), season, episode, DownloadStatus::Queued)
                .with_slug(slug),
        );
        Ok(EnqueueStatus::Queued)
    }

    async fn enqueue_season(
        &self,
        series_id: &MediaId,
        season: u32,
        slug: &str,
    ) -> ApiResult<SeasonEnqueueReport> {
        self.begin_action().await?;
        let episodes = (1..=2)
            .map(|episode| {
                self.push_queued(
                    DownloadableItem::episode(
                        series_id.clone(),
                        season,
                        episode,
                        DownloadStatus::Queued,
                    )
                    .with_slug(slug),
                );
                EpisodeEnqueueStatus {
                    episode,
                    status: DownloadStatus::Queued,
                }
            })
            .collect();
        Ok(SeasonEnqueueReport {
            status: "queued".to_string(),
            episodes,
        })
    }

    async fn watchlist(&self) -> ApiResult<Vec<WatchlistEntry>> {
        Ok(lock(&self.watchlist).clone())
    }

    async fn add_watchlist(&self, entry: &NewWatchlistEntry) -> ApiResult<()> {
        self.begin_action().await?;
        let mut watchlist = lock(&self.watchlist);
        if watchlist
            .iter()
            .any(|tracked| tracked.series_slug == entry.slug)
        {
            return Err(ApiError::Rejected {
                endpoint: "/server/watchlist/add".to_string(),
                status: Some(400),
                message: "already tracked".to_string(),
            });
        }
        watchlist.push(WatchlistEntry {
            series_slug: entry.slug.clone(),
            title_url: Some(entry.title_url.clone()),
            added_on: None,
            tracked_season_count: entry.season_count,
        });
        Ok(())
    }

    async fn update_watchlist(&self, update: &WatchlistSeasonUpdate) -> ApiResult<()> {
        self.begin_action().await?;
        lock(&self.updates).push(update.clone());
        Ok(())
    }

    async fn remove_watchlist(&self, removal: &WatchlistRemoval) -> ApiResult<()> {
        self.begin_action().await?;
        let mut watchlist = lock(&self.watchlist);
        let before = watchlist.len();
        watchlist.retain(|entry| entry.series_slug != removal.name);
        if watchlist.len() == before {
            return Err(not_found("/server/watchlist/remove"));
        }
        Ok(())
    }

    async fn check_new_seasons(&self) -> ApiResult<Vec<NewSeasonNotice>> {
        self.begin_action().await?;
        Ok(lock(&self.notices).clone())
    }

    async fn movie_path(&self, id: &MediaId) -> ApiResult<String> {
        lock(&self.items)
            .iter()
            .find(|item| item.identity() == ItemIdentity::movie(id.clone()))
            .and_then(|item| item.file_path.clone())
            .ok_or_else(|| not_found("/server/path/movie"))
    }

    async fn episode_path(
        &self,
        series_id: &MediaId,
        season: u32,
        episode: u32,
    ) -> ApiResult<String> {
        let wanted = ItemIdentity::episode(series_id.clone(), season, episode);
        lock(&self.items)
            .iter()
            .find(|item| item.identity() == wanted)
            .and_then(|item| item.file_path.clone())
            .ok_or_else(|| not_found("/server/path/episode"))
    }
}
