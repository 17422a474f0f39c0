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
#![allow(clippy::module_name_repetitions)]

//! Download, queue, and watchlist models shared across the streamdock workspace.
//!
//! Layout: `identity.rs` (identity tuple and validation), `item.rs`
//! (downloadable items and status), `queue.rs` (queue and poll snapshots),
//! `watchlist.rs` (watchlist payloads), `enqueue.rs` (enqueue responses),
//! `wire.rs` (lenient decoding helpers for backend quirks).

pub mod enqueue;
pub mod error;
pub mod identity;
pub mod item;
pub mod queue;
pub mod watchlist;
mod wire;

pub use enqueue::{EnqueueRequest, EnqueueStatus, EpisodeEnqueueStatus, SeasonEnqueueReport};
pub use error::{ValidationError, ValidationResult};
pub use identity::{ItemIdentity, MediaId, MediaType};
pub use item::{DownloadStatus, DownloadableItem};
pub use queue::{DownloadSnapshot, QueueSnapshot};
pub use watchlist::{
    ListBody, NewSeasonNotice, NewWatchlistEntry, WatchlistEntry, WatchlistRemoval,
    WatchlistSeasonUpdate,
};
