//! Server-side connection handling.
//!
//! [`Session`] is the pure protocol state machine: chunks in, outcomes
//! out, no I/O. [`ServerConnection`] is its async driver, owning the
//! reader and writer halves of one accepted stream and invoking the
//! application [`Handler`] for each dispatched request. [`ServerConfig`]
//! carries the per-server knobs both of them consult.
//!
//! [`Handler`]: crate::handler::Handler

mod config;
mod server;
mod session;

pub use config::ServerConfig;
pub use server::ServerConnection;
pub use session::Outcome;
pub use session::Session;
pub use session::WireResponse;
