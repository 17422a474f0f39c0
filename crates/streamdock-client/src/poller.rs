//! Periodic snapshot refresh with request coalescing.
//!
//! # Design
//! - A cycle fetches the item list and the queue concurrently and publishes
//!   both together, or nothing.
//! - Cycles run as spawned tasks; every caller that arrives while one is in
//!   flight awaits the same `Shared` outcome instead of issuing new requests.
//! - `stop()` bumps a liveness epoch. A cycle started under an older epoch
//!   may finish its fetch but never publishes.
//! - Failures only move freshness; the timer keeps its cadence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use streamdock_config::ClientConfig;
use streamdock_config::defaults::DEFAULT_STALE_AFTER_FAILURES;
use streamdock_events::{Event, EventBus, Freshness};
use streamdock_model::DownloadSnapshot;
use streamdock_telemetry::{CYCLE_CANCELLED, CYCLE_FAILED, CYCLE_PUBLISHED, Metrics};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::BackendApi;
use crate::error::{ApiError, ApiResult, PollError};

/// Shortest timer period accepted by [`Poller::start`].
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome shared by every waiter of one cycle.
pub type CycleOutcome = Result<Arc<DownloadSnapshot>, PollError>;

type SharedCycle = Shared<BoxFuture<'static, CycleOutcome>>;

/// State published after every settled cycle.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Latest good snapshot; kept across failed cycles.
    pub snapshot: Option<Arc<DownloadSnapshot>>,
    /// How far the snapshot can be trusted.
    pub freshness: Freshness,
    /// Count of published snapshots.
    pub revision: u64,
    /// Current failure streak.
    pub consecutive_failures: u32,
    /// Error of the most recent failed cycle, cleared on success.
    pub last_error: Option<ApiError>,
}

/// Construction options for [`Poller`].
#[derive(Clone)]
pub struct PollerOptions {
    /// Failure streak at which freshness becomes stale.
    pub stale_after_failures: u32,
    /// Optional bus receiving poll events.
    pub events: Option<EventBus>,
    /// Optional metrics registry.
    pub metrics: Option<Metrics>,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            stale_after_failures: DEFAULT_STALE_AFTER_FAILURES,
            events: None,
            metrics: None,
        }
    }
}

impl PollerOptions {
    /// Options carrying the configured stale threshold.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            stale_after_failures: config.stale_after_failures,
            ..Self::default()
        }
    }

    /// Publish poll events on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Record poll metrics in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Keeps a [`DownloadSnapshot`] fresh by polling the backend.
///
/// Cloning is cheap; clones drive the same timer and state.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    backend: Arc<dyn BackendApi>,
    state: watch::Sender<PollState>,
    in_flight: Mutex<Option<InFlight>>,
    lifecycle: Mutex<Lifecycle>,
    next_cycle: AtomicU64,
    stale_after: u32,
    events: Option<EventBus>,
    metrics: Option<Metrics>,
}

struct InFlight {
    id: u64,
    cycle: SharedCycle,
}

enum Claim {
    /// Cycle whose outcome answers the caller.
    Joined(SharedCycle),
    /// Cycle that began before the caller's floor; awaited, then replaced.
    Predates(SharedCycle),
}

#[derive(Default)]
struct Lifecycle {
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl Poller {
    /// Create an idle poller. Nothing is fetched until [`Self::start`] or
    /// [`Self::refresh_now`] is called.
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>, options: PollerOptions) -> Self {
        let (state, _) = watch::channel(PollState::default());
        Self {
            inner: Arc::new(PollerInner {
                backend,
                state,
                in_flight: Mutex::new(None),
                lifecycle: Mutex::new(Lifecycle::default()),
                next_cycle: AtomicU64::new(1),
                stale_after: options.stale_after_failures.max(1),
                events: options.events,
                metrics: options.metrics,
            }),
        }
    }

    /// Run a cycle now, or join the one already in flight.
    ///
    /// # Errors
    ///
    /// Returns the fetch error of the cycle, or [`PollError::Cancelled`] when
    /// the poller was stopped before the cycle published.
    pub async fn refresh_now(&self) -> CycleOutcome {
        self.inner.cycle_from(0).await
    }

    /// Refresh with a cycle that starts after this call.
    ///
    /// A cycle already in flight may have read the backend before a change
    /// the caller just made, so it is awaited and then followed by a newer
    /// one. Cycles started after this call are still joined.
    ///
    /// # Errors
    ///
    /// Same as [`Self::refresh_now`].
    pub async fn refresh_after_change(&self) -> CycleOutcome {
        let floor = self.inner.next_cycle.load(Ordering::SeqCst);
        self.inner.cycle_from(floor).await
    }

    /// Begin polling every `interval`, replacing any running timer.
    ///
    /// The first cycle starts immediately. Periods below
    /// [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn start(&self, interval: Duration) {
        let period = interval.max(MIN_POLL_INTERVAL);
        let weak = Arc::downgrade(&self.inner);
        let mut lifecycle = lock(&self.inner.lifecycle);
        if let Some(previous) = lifecycle.timer.take() {
            previous.abort();
        }
        lifecycle.timer = Some(tokio::spawn(tick_loop(weak, period)));
        info!(
            interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "poller started"
        );
    }

    /// Stop the timer and discard whatever cycle is still in flight.
    ///
    /// Waiters of that cycle receive [`PollError::Cancelled`]. Later calls to
    /// [`Self::refresh_now`] start fresh cycles that publish normally.
    pub fn stop(&self) {
        let mut slot = lock(&self.inner.in_flight);
        let mut lifecycle = lock(&self.inner.lifecycle);
        lifecycle.epoch += 1;
        let timer = lifecycle.timer.take();
        let abandoned = slot.take();
        drop(lifecycle);
        drop(slot);

        if let Some(in_flight) = abandoned {
            debug!(cycle = in_flight.id, "in-flight poll cycle abandoned");
        }
        if let Some(timer) = timer {
            timer.abort();
            info!("poller stopped");
        }
    }

    /// Whether a timer is currently driving cycles.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.inner.lifecycle)
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Receiver notified on every published change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    /// Copy of the latest published state.
    #[must_use]
    pub fn current(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    /// Start polling and return a guard that stops on drop.
    #[must_use]
    pub fn scoped(&self, interval: Duration) -> PollerGuard {
        self.start(interval);
        PollerGuard {
            poller: self.clone(),
        }
    }
}

/// Stops its poller when dropped, e.g. when a view goes out of scope.
pub struct PollerGuard {
    poller: Poller,
}

impl std::ops::Deref for PollerGuard {
    type Target = Poller;

    fn deref(&self) -> &Self::Target {
        &self.poller
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.poller.stop();
    }
}

impl PollerInner {
    async fn cycle_from(self: &Arc<Self>, floor: u64) -> CycleOutcome {
        loop {
            match self.claim_cycle(floor) {
                Claim::Joined(cycle) => return cycle.await,
                Claim::Predates(cycle) => {
                    let _ = cycle.await;
                }
            }
        }
    }

    fn claim_cycle(self: &Arc<Self>, floor: u64) -> Claim {
        let mut slot = lock(&self.in_flight);
        if let Some(in_flight) = slot.as_ref() {
            if in_flight.id < floor {
                debug!(cycle = in_flight.id, floor, "waiting out older poll cycle");
                return Claim::Predates(in_flight.cycle.clone());
            }
            debug!(cycle = in_flight.id, "joining in-flight poll cycle");
            return Claim::Joined(in_flight.cycle.clone());
        }

        let epoch = lock(&self.lifecycle).epoch;
        let id = self.next_cycle.fetch_add(1, Ordering::SeqCst);
        let task = tokio::spawn(Arc::clone(self).run_cycle(id, epoch));
        let cycle = async move { task.await.unwrap_or_else(|_| Err(PollError::Cancelled)) }
            .boxed()
            .shared();
        *slot = Some(InFlight {
            id,
            cycle: cycle.clone(),
        });
        Claim::Joined(cycle)
    }

    async fn run_cycle(self: Arc<Self>, id: u64, epoch: u64) -> CycleOutcome {
        let started = Instant::now();
        let (items, queue) = tokio::join!(self.backend.list_items(), self.backend.queue_status());
        let fetched = match (items, queue) {
            (Ok(items), Ok(queue)) => Ok(DownloadSnapshot::new(items, queue)),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };

        let outcome = self.settle(id, epoch, fetched);
        self.release(id);
        if let Some(metrics) = &self.metrics {
            metrics.observe_cycle_latency(started.elapsed());
        }
        outcome
    }

    fn settle(&self, id: u64, epoch: u64, fetched: ApiResult<DownloadSnapshot>) -> CycleOutcome {
        let lifecycle = lock(&self.lifecycle);
        if lifecycle.epoch != epoch {
            drop(lifecycle);
            debug!(cycle = id, "discarding cycle from a stopped poller");
            self.count_cycle(CYCLE_CANCELLED);
            return Err(PollError::Cancelled);
        }

        match fetched {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let mut previous = Freshness::Loading;
                let mut revision = 0;
                self.state.send_modify(|state| {
                    previous = state.freshness;
                    state.revision += 1;
                    revision = state.revision;
                    state.snapshot = Some(Arc::clone(&snapshot));
                    state.freshness = Freshness::Fresh;
                    state.consecutive_failures = 0;
                    state.last_error = None;
                });
                drop(lifecycle);

                debug!(
                    cycle = id,
                    revision,
                    items = snapshot.items.len(),
                    "snapshot published"
                );
                self.count_cycle(CYCLE_PUBLISHED);
                if let Some(metrics) = &self.metrics {
                    metrics.set_consecutive_failures(0);
                    metrics.set_queue_depth(snapshot.queue.depth());
                }
                self.emit(Event::SnapshotPublished {
                    revision,
                    items: snapshot.items.len(),
                    queue_depth: snapshot.queue.depth(),
                });
                self.note_freshness(previous, Freshness::Fresh);
                Ok(snapshot)
            }
            Err(err) => {
                let mut previous = Freshness::Loading;
                let mut failures = 0;
                let mut freshness = Freshness::Loading;
                self.state.send_modify(|state| {
                    previous = state.freshness;
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    failures = state.consecutive_failures;
                    state.freshness = Freshness::after_failures(failures, self.stale_after);
                    freshness = state.freshness;
                    state.last_error = Some(err.clone());
                });
                drop(lifecycle);

                warn!(cycle = id, failures, error = %err, "poll cycle failed");
                self.count_cycle(CYCLE_FAILED);
                if let Some(metrics) = &self.metrics {
                    metrics.set_consecutive_failures(failures);
                }
                self.emit(Event::PollFailed {
                    consecutive_failures: failures,
                    message: err.to_string(),
                });
                self.note_freshness(previous, freshness);
                Err(PollError::Api(err))
            }
        }
    }

    fn release(&self, id: u64) {
        let mut slot = lock(&self.in_flight);
        if slot.as_ref().is_some_and(|in_flight| in_flight.id == id) {
            *slot = None;
        }
    }

    fn note_freshness(&self, previous: Freshness, current: Freshness) {
        if previous.label() != current.label() {
            info!(from = %previous, to = %current, "snapshot freshness changed");
            self.emit(Event::FreshnessChanged { freshness: current });
        }
    }

    fn count_cycle(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_poll_cycle(outcome);
        }
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

impl Drop for PollerInner {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = lifecycle.timer.take() {
            timer.abort();
        }
    }
}

async fn tick_loop(inner: Weak<PollerInner>, period: Duration) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        let (Claim::Joined(cycle) | Claim::Predates(cycle)) = inner.claim_cycle(0);
        drop(inner);
        if let Err(err) = cycle.await {
            debug!(error = %err, "timer cycle did not publish");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
