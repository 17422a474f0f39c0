//! Event bus routing helpers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};

use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};

/// Shared event bus built on top of `tokio::broadcast`.
///
/// Overflow drops the oldest events for both live subscribers and the
/// replay ring.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    replay: Arc<Mutex<VecDeque<EventEnvelope>>>,
    replay_capacity: usize,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Construct a bus with a custom replay capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(replay_capacity: usize) -> Self {
        let replay_capacity = replay_capacity.max(1);
        let (sender, _) = broadcast::channel(replay_capacity);
        Self {
            sender,
            replay: Arc::new(Mutex::new(VecDeque::with_capacity(replay_capacity))),
            replay_capacity,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Construct a bus with the default replay capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish an event, returning its assigned id.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        {
            let mut replay = self.lock_replay();
            if replay.len() == self.replay_capacity {
                let _ = replay.pop_front();
            }
            replay.push_back(envelope.clone());
        }
        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe, replaying buffered events newer than `since_id` first.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let receiver = self.sender.subscribe();
        let backlog = since_id.map_or_else(VecDeque::new, |since| {
            self.backlog_since(since).into_iter().collect()
        });
        let last_replayed = backlog.back().map(|envelope: &EventEnvelope| envelope.id);
        EventStream {
            backlog,
            receiver,
            last_replayed,
        }
    }

    /// Last event id held in the replay buffer.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.lock_replay().back().map(|envelope| envelope.id)
    }

    /// Buffered events emitted after `id`.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        self.lock_replay()
            .iter()
            .filter(|envelope| envelope.id > id)
            .cloned()
            .collect()
    }

    fn lock_replay(&self) -> MutexGuard<'_, VecDeque<EventEnvelope>> {
        self.replay.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscriber handle yielding the replay backlog, then live events.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    last_replayed: Option<EventId>,
}

impl EventStream {
    /// Next event, or `None` once every bus handle is dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Some(envelope);
        }
        loop {
            match self.receiver.recv().await {
                // Skip live copies of events already served from the backlog.
                Ok(envelope) if self.last_replayed.is_some_and(|last| envelope.id <= last) => {}
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
