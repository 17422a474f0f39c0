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

//! Backend access, snapshot polling, and action dispatch for streamdock.
//!
//! Layout: `api.rs` (backend trait), `http.rs` (`reqwest` implementation),
//! `poller.rs` (coalescing status poller), `dispatcher.rs` (guarded
//! mutations with resync), `error.rs` (error taxonomy).

pub mod api;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod poller;

#[cfg(test)]
mod testing;

pub use api::BackendApi;
pub use dispatcher::{ActionKind, ActionOutcome, Dispatcher};
pub use error::{ApiError, ApiResult, PollError};
pub use http::{HttpBackend, stream_url};
pub use poller::{CycleOutcome, MIN_POLL_INTERVAL, PollState, Poller, PollerGuard, PollerOptions};
