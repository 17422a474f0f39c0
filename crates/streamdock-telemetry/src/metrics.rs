//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Collector registration stays private; callers get typed recorders.
//! - Label values come from small fixed sets owned by the client crate.

use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label for a published poll cycle.
pub const CYCLE_PUBLISHED: &str = "published";
/// Outcome label for a failed poll cycle.
pub const CYCLE_FAILED: &str = "failed";
/// Outcome label for a cycle whose poller stopped before it finished.
pub const CYCLE_CANCELLED: &str = "cancelled";

/// Prometheus-backed metrics registry shared by the poller and dispatcher.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    poll_cycles_total: IntCounterVec,
    poll_consecutive_failures: IntGauge,
    poll_cycle_latency_ms: IntGauge,
    actions_total: IntCounterVec,
    queue_depth: IntGauge,
}

/// Point-in-time summary of the poll and action collectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Cycles that published a snapshot.
    pub cycles_published: u64,
    /// Cycles discarded after a fetch failure.
    pub cycles_failed: u64,
    /// Cycles discarded because the poller stopped.
    pub cycles_cancelled: u64,
    /// Current failure streak.
    pub consecutive_failures: i64,
    /// Duration of the latest completed cycle (ms).
    pub last_cycle_latency_ms: i64,
    /// Items waiting in the backend queue at the last publish.
    pub queue_depth: i64,
}

impl Metrics {
    /// Construct a registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let poll_cycles_total = register(
            &registry,
            "poll_cycles_total",
            IntCounterVec::new(
                Opts::new("poll_cycles_total", "Poll cycles by outcome"),
                &["outcome"],
            ),
        )?;
        let poll_consecutive_failures = register(
            &registry,
            "poll_consecutive_failures",
            IntGauge::with_opts(Opts::new(
                "poll_consecutive_failures",
                "Consecutive failed poll cycles",
            )),
        )?;
        let poll_cycle_latency_ms = register(
            &registry,
            "poll_cycle_latency_ms",
            IntGauge::with_opts(Opts::new(
                "poll_cycle_latency_ms",
                "Duration of the latest poll cycle (ms)",
            )),
        )?;
        let actions_total = register(
            &registry,
            "actions_total",
            IntCounterVec::new(
                Opts::new("actions_total", "Dispatched actions by kind and outcome"),
                &["action", "outcome"],
            ),
        )?;
        let queue_depth = register(
            &registry,
            "queue_depth",
            IntGauge::with_opts(Opts::new(
                "queue_depth",
                "Items waiting in the backend download queue",
            )),
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                poll_cycles_total,
                poll_consecutive_failures,
                poll_cycle_latency_ms,
                actions_total,
                queue_depth,
            }),
        })
    }

    /// Count a finished poll cycle.
    pub fn inc_poll_cycle(&self, outcome: &str) {
        self.inner
            .poll_cycles_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record the current failure streak.
    pub fn set_consecutive_failures(&self, failures: u32) {
        self.inner
            .poll_consecutive_failures
            .set(i64::from(failures));
    }

    /// Record how long the latest cycle took.
    pub fn observe_cycle_latency(&self, duration: Duration) {
        self.inner
            .poll_cycle_latency_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Count a dispatched action.
    pub fn inc_action(&self, action: &str, outcome: &str) {
        self.inner
            .actions_total
            .with_label_values(&[action, outcome])
            .inc();
    }

    /// Actions counted so far for the label pair.
    #[must_use]
    pub fn action_count(&self, action: &str, outcome: &str) -> u64 {
        self.inner
            .actions_total
            .with_label_values(&[action, outcome])
            .get()
    }

    /// Set the queue depth gauge.
    pub fn set_queue_depth(&self, depth: usize) {
        self.inner
            .queue_depth
            .set(i64::try_from(depth).unwrap_or(i64::MAX));
    }

    /// Render the registry in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the poll collectors.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let cycles = |outcome: &str| {
            self.inner
                .poll_cycles_total
                .with_label_values(&[outcome])
                .get()
        };
        MetricsSnapshot {
            cycles_published: cycles(CYCLE_PUBLISHED),
            cycles_failed: cycles(CYCLE_FAILED),
            cycles_cancelled: cycles(CYCLE_CANCELLED),
            consecutive_failures: self.inner.poll_consecutive_failures.get(),
            last_cycle_latency_ms: self.inner.poll_cycle_latency_ms.get(),
            queue_depth: self.inner.queue_depth.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn register<C>(
    registry: &Registry,
    name: &'static str,
    collector: prometheus::Result<C>,
) -> Result<C>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    let collector =
        collector.map_err(|source| TelemetryError::MetricsRegister { name, source })?;
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })?;
    Ok(collector)
}
