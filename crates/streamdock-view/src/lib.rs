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

//! Pure view-model derivation for streamdock snapshots.
//!
//! Every presentation surface renders item status through this crate so badge
//! precedence lives in exactly one place. Nothing here performs I/O.

pub mod downloads;
pub mod grouping;
pub mod state;
pub mod stream;

pub use downloads::{DownloadsView, EpisodeGroupView, ItemView, QueueEntryView};
pub use grouping::{EpisodeGrouping, group_episodes};
pub use state::{BadgeKind, PrimaryAction, ViewState, ViewStateMap, compute_view_state};
pub use stream::{STREAM_SEGMENT, stream_path};
