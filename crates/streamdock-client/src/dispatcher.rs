//! User-triggered mutations with duplicate suppression and resync.
//!
//! # Design
//! - Arguments are validated before anything else; a rejected call never
//!   claims a slot or reaches the backend.
//! - At most one call per `(action, target)` pair is in flight. The slot is an
//!   RAII guard, so failures and dropped futures release it too.
//! - Every call that reached the backend successfully, or found its target
//!   already gone, awaits a poller refresh before returning. Nothing is
//!   applied to local state optimistically.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use streamdock_events::{Event, EventBus};
use streamdock_model::{
    EnqueueRequest, EnqueueStatus, ItemIdentity, MediaId, NewSeasonNotice, NewWatchlistEntry,
    SeasonEnqueueReport, ValidationError, WatchlistRemoval, WatchlistSeasonUpdate,
};
use streamdock_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::api::BackendApi;
use crate::error::{ApiError, ApiResult};
use crate::poller::Poller;

/// Kinds of mutation the dispatcher performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Remove a downloaded movie or episode.
    Delete,
    /// Request a movie or episode download.
    Enqueue,
    /// Request every episode of a season.
    EnqueueSeason,
    /// Start tracking a series.
    WatchlistAdd,
    /// Record a new tracked season count.
    WatchlistUpdate,
    /// Stop tracking a series.
    WatchlistRemove,
    /// Check for new seasons and record each one.
    WatchlistSync,
}

impl ActionKind {
    /// Stable label used in logs, metrics, and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Enqueue => "enqueue",
            Self::EnqueueSeason => "enqueue_season",
            Self::WatchlistAdd => "watchlist_add",
            Self::WatchlistUpdate => "watchlist_update",
            Self::WatchlistRemove => "watchlist_remove",
            Self::WatchlistSync => "watchlist_sync",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// What a successful dispatch achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The backend applied the change.
    Applied,
    /// The target no longer existed; nothing changed.
    AlreadyGone,
    /// The backend answered an enqueue request.
    Enqueued(EnqueueStatus),
    /// The backend answered a season enqueue request.
    SeasonQueued(SeasonEnqueueReport),
    /// Season notices found and recorded by a watchlist sync.
    SeasonsSynced(Vec<NewSeasonNotice>),
}

impl ActionOutcome {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyGone => "already_gone",
            Self::Enqueued(_) => "enqueued",
            Self::SeasonQueued(_) => "season_queued",
            Self::SeasonsSynced(_) => "seasons_synced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ActionKey {
    kind: ActionKind,
    target: String,
}

type ActionSlots = Arc<Mutex<HashSet<ActionKey>>>;

struct ActionGuard {
    slots: ActionSlots,
    key: ActionKey,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        lock(&self.slots).remove(&self.key);
    }
}

/// Runs mutations against the backend and resyncs the poller afterwards.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn BackendApi>,
    poller: Poller,
    slots: ActionSlots,
    events: Option<EventBus>,
    metrics: Option<Metrics>,
}

impl Dispatcher {
    /// Dispatcher sharing `poller` for post-action refreshes.
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>, poller: Poller) -> Self {
        Self {
            backend,
            poller,
            slots: Arc::new(Mutex::new(HashSet::new())),
            events: None,
            metrics: None,
        }
    }

    /// Publish action events on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Count actions in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Delete a downloaded movie or episode.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a malformed identity,
    /// [`ApiError::Conflict`] while the same delete is running, or the backend
    /// failure. A target the backend no longer knows yields
    /// [`ActionOutcome::AlreadyGone`].
    pub async fn delete_item(&self, identity: &ItemIdentity) -> ApiResult<ActionOutcome> {
        identity.validate()?;
        let call = async {
            let deleted = match identity.episode_numbers() {
                Some((season, episode)) => {
                    self.backend
                        .delete_episode(&identity.id, season, episode)
                        .await
                }
                None => self.backend.delete_movie(&identity.id).await,
            };
            deleted.map(|()| ActionOutcome::Applied)
        };
        self.dispatch(ActionKind::Delete, identity.to_string(), call)
            .await
    }

    /// Request a movie or episode download.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::delete_item`]; an `error` status answer is
    /// returned as [`ApiError::Rejected`].
    pub async fn enqueue(&self, request: &EnqueueRequest) -> ApiResult<ActionOutcome> {
        request.validate()?;
        let identity = &request.identity;
        let call = async {
            let status = match identity.episode_numbers() {
                Some((season, episode)) => {
                    self.backend
                        .enqueue_episode(&identity.id, season, episode, &request.slug)
                        .await
                }
                None => {
                    self.backend
                        .enqueue_movie(&identity.id, &request.slug)
                        .await
                }
            };
            status.map(ActionOutcome::Enqueued)
        };
        self.dispatch(ActionKind::Enqueue, identity.to_string(), call)
            .await
    }

    /// Request every episode of one season.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::delete_item`].
    pub async fn enqueue_season(
        &self,
        series_id: &MediaId,
        season: u32,
        slug: &str,
    ) -> ApiResult<ActionOutcome> {
        if series_id.is_blank() {
            return Err(ValidationError::BlankId.into());
        }
        if season == 0 {
            return Err(ValidationError::ZeroNumber { field: "season" }.into());
        }
        if slug.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "slug" }.into());
        }
        let call = async {
            self.backend
                .enqueue_season(series_id, season, slug.trim())
                .await
                .map(ActionOutcome::SeasonQueued)
        };
        self.dispatch(
            ActionKind::EnqueueSeason,
            format!("tv:{series_id}:S{season:02}"),
            call,
        )
        .await
    }

    /// Start tracking a series.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::delete_item`]; the backend rejects series that
    /// are already tracked.
    pub async fn add_watchlist(&self, entry: &NewWatchlistEntry) -> ApiResult<ActionOutcome> {
        entry.validate()?;
        let call = async {
            self.backend
                .add_watchlist(entry)
                .await
                .map(|()| ActionOutcome::Applied)
        };
        self.dispatch(ActionKind::WatchlistAdd, entry.slug.clone(), call)
            .await
    }

    /// Record `season` as the tracked season count of the series at `url`.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::delete_item`].
    pub async fn update_watchlist_season(
        &self,
        url: &str,
        season: u32,
    ) -> ApiResult<ActionOutcome> {
        if url.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "url" }.into());
        }
        if season == 0 {
            return Err(ValidationError::ZeroNumber { field: "season" }.into());
        }
        let update = WatchlistSeasonUpdate {
            url: url.trim().to_string(),
            season,
        };
        let call = async {
            self.backend
                .update_watchlist(&update)
                .await
                .map(|()| ActionOutcome::Applied)
        };
        self.dispatch(ActionKind::WatchlistUpdate, update.url.clone(), call)
            .await
    }

    /// Stop tracking a series.
    ///
    /// # Errors
    ///
    /// Same policy as [`Self::delete_item`].
    pub async fn remove_watchlist(&self, slug: &str) -> ApiResult<ActionOutcome> {
        if slug.trim().is_empty() {
            return Err(ValidationError::BlankField { field: "slug" }.into());
        }
        let removal = WatchlistRemoval {
            name: slug.trim().to_string(),
        };
        let call = async {
            self.backend
                .remove_watchlist(&removal)
                .await
                .map(|()| ActionOutcome::Applied)
        };
        self.dispatch(ActionKind::WatchlistRemove, removal.name.clone(), call)
            .await
    }

    /// Ask the backend for series with new seasons and record each one.
    ///
    /// # Errors
    ///
    /// Returns the first failing check or update; updates recorded before it
    /// stay recorded.
    pub async fn sync_new_seasons(&self) -> ApiResult<ActionOutcome> {
        let call = async {
            let notices = self.backend.check_new_seasons().await?;
            for notice in &notices {
                debug!(
                    series = %notice.name,
                    season = notice.season,
                    new = notice.new_seasons,
                    "recording new season"
                );
                self.backend.update_watchlist(&notice.to_update()).await?;
            }
            Ok(ActionOutcome::SeasonsSynced(notices))
        };
        self.dispatch(ActionKind::WatchlistSync, "watchlist".to_string(), call)
            .await
    }

    async fn dispatch<F>(
        &self,
        kind: ActionKind,
        target: String,
        call: F,
    ) -> ApiResult<ActionOutcome>
    where
        F: Future<Output = ApiResult<ActionOutcome>>,
    {
        let _guard = match self.claim(kind, &target) {
            Ok(guard) => guard,
            Err(err) => {
                debug!(action = %kind, %target, "duplicate action rejected");
                self.count(kind, err.kind());
                return Err(err);
            }
        };

        debug!(action = %kind, %target, "dispatching action");
        let outcome = match call.await {
            Ok(outcome) => outcome,
            Err(ApiError::NotFound { message, .. }) => {
                info!(action = %kind, %target, detail = %message, "target already gone");
                ActionOutcome::AlreadyGone
            }
            Err(err) => {
                warn!(action = %kind, %target, error = %err, "action failed");
                self.count(kind, err.kind());
                self.emit(Event::ActionFailed {
                    action: kind.as_str().to_string(),
                    target,
                    message: err.to_string(),
                });
                return Err(err);
            }
        };

        if let Err(err) = self.poller.refresh_after_change().await {
            debug!(
                action = %kind,
                %target,
                error = %err,
                "refresh after action did not publish"
            );
        }

        info!(action = %kind, %target, outcome = outcome.label(), "action completed");
        self.count(kind, outcome.label());
        self.emit(Event::ActionCompleted {
            action: kind.as_str().to_string(),
            target,
            outcome: outcome.label().to_string(),
        });
        Ok(outcome)
    }

    fn claim(&self, kind: ActionKind, target: &str) -> ApiResult<ActionGuard> {
        let key = ActionKey {
            kind,
            target: target.to_string(),
        };
        if !lock(&self.slots).insert(key.clone()) {
            return Err(ApiError::Conflict {
                action: kind.as_str(),
                target: key.target,
            });
        }
        Ok(ActionGuard {
            slots: Arc::clone(&self.slots),
            key,
        })
    }

    fn count(&self, kind: ActionKind, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_action(kind.as_str(), outcome);
        }
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
