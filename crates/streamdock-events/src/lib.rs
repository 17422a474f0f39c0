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

//! Event bus for streamdock poll and action signals.
//!
//! Publishers get sequential ids; subscribers can replay recent events after
//! reconnecting. Internally a bounded `tokio::broadcast` channel drops the
//! oldest events on overflow.

pub mod payloads;
pub mod routing;

pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId, Freshness};
pub use routing::{EventBus, EventStream};
