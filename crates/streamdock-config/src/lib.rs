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

//! Client configuration for reaching and polling the streamdock backend.
//!
//! Layout: `model.rs` (typed settings and endpoint URL building),
//! `loader.rs` (`STREAMDOCK_*` environment loading), `validate.rs`
//! (parsing/validation helpers), `defaults.rs` (reference values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{ClientConfig, Endpoints, PollCadence};
pub use validate::{normalize_prefix, parse_base_url};
