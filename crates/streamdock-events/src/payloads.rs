//! Event payloads and envelope types.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default size of the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// How much a reader can trust the published snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Freshness {
    /// Nothing has been published yet and no cycle has failed.
    #[default]
    Loading,
    /// The last cycle succeeded.
    Fresh,
    /// Recent cycles failed; the snapshot is kept but may lag.
    Degraded {
        /// Consecutive failed cycles.
        failures: u32,
    },
    /// Enough consecutive cycles failed that the snapshot should be
    /// flagged as out of date.
    Stale {
        /// Consecutive failed cycles.
        failures: u32,
    },
}

impl Freshness {
    /// Classify a failure streak against the stale threshold.
    #[must_use]
    pub const fn after_failures(failures: u32, stale_after: u32) -> Self {
        if failures == 0 {
            Self::Fresh
        } else if failures >= stale_after {
            Self::Stale { failures }
        } else {
            Self::Degraded { failures }
        }
    }

    /// Short label for logs and status lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Fresh => "fresh",
            Self::Degraded { .. } => "degraded",
            Self::Stale { .. } => "stale",
        }
    }
}

impl Display for Freshness {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded { failures } | Self::Stale { failures } => {
                write!(formatter, "{} ({failures} failed)", self.label())
            }
            Self::Loading | Self::Fresh => formatter.write_str(self.label()),
        }
    }
}

/// Signals emitted by the poller and the action dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A poll cycle produced a new snapshot.
    SnapshotPublished {
        /// Monotonic revision of the published state.
        revision: u64,
        /// Items in the snapshot.
        items: usize,
        /// Items waiting in the backend queue.
        queue_depth: usize,
    },
    /// A poll cycle failed and was discarded.
    PollFailed {
        /// Consecutive failures including this one.
        consecutive_failures: u32,
        /// Rendered error.
        message: String,
    },
    /// Snapshot freshness moved to a different level.
    FreshnessChanged {
        /// New level.
        freshness: Freshness,
    },
    /// A mutating action reached the backend and succeeded.
    ActionCompleted {
        /// Action kind, e.g. `delete` or `enqueue`.
        action: String,
        /// Target rendered as text.
        target: String,
        /// Outcome label.
        outcome: String,
    },
    /// A mutating action failed.
    ActionFailed {
        /// Action kind.
        action: String,
        /// Target rendered as text.
        target: String,
        /// Rendered error.
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SnapshotPublished { .. } => "snapshot_published",
            Self::PollFailed { .. } => "poll_failed",
            Self::FreshnessChanged { .. } => "freshness_changed",
            Self::ActionCompleted { .. } => "action_completed",
            Self::ActionFailed { .. } => "action_failed",
        }
    }
}

/// Event plus its id and emission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Payload.
    pub event: Event,
}
