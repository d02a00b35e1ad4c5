//! Incremental wire extraction and insertion.
//!
//! The functions here operate purely on byte buffers and cursor state;
//! they know nothing about sockets or sessions. Messages may arrive split
//! at arbitrary boundaries, so each call consumes what it can of the
//! supplied chunk and reports exactly how far it got:
//!
//! - [`extract_header`]: accumulates bytes until the header terminator,
//!   bounded by a hard capacity, distinguishing "need more data" from
//!   malformed input
//! - [`extract_content`] / [`insert_content`]: length-bounded body
//!   transfer in both directions
//!
//! The per-connection sequencing of these primitives lives in
//! [`crate::connection`] (server) and [`crate::client`].

mod content;
mod scan;

pub use content::ContentExtract;
pub use content::ContentInsert;
pub use content::extract_content;
pub use content::insert_content;
pub use scan::HeaderScan;
pub use scan::extract_header;
