//! Reference defaults for a locally hosted backend.

use std::time::Duration;

/// Backend origin.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
/// Prefix of the queue and enqueue endpoints.
pub const DEFAULT_API_PREFIX: &str = "/api";
/// Prefix of the item, watchlist, path, delete, and stream endpoints.
pub const DEFAULT_SERVER_PREFIX: &str = "/server";
/// Poll interval for list views.
pub const DEFAULT_LIST_INTERVAL: Duration = Duration::from_millis(5_000);
/// Poll interval for a single-item detail view.
pub const DEFAULT_DETAIL_INTERVAL: Duration = Duration::from_millis(1_000);
/// Consecutive failed cycles before the snapshot is flagged stale.
pub const DEFAULT_STALE_AFTER_FAILURES: u32 = 2;
/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
