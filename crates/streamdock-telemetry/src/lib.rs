#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Telemetry primitives shared across the streamdock workspace.
//!
//! Layout: `init.rs` (logging setup), `metrics.rs` (Prometheus registry),
//! `error.rs` (telemetry error types).

pub mod error;
pub mod init;
pub mod metrics;

pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use metrics::{CYCLE_CANCELLED, CYCLE_FAILED, CYCLE_PUBLISHED, Metrics, MetricsSnapshot};
