//! Core HTTP message models.
//!
//! This module provides the data types the rest of the engine moves around:
//!
//! - **Field storage** ([`fields`]): [`FieldStore`], the insertion-ordered
//!   name/value collection backing every message
//! - **Messages** ([`request`], [`response`]): [`Request`] and [`Response`],
//!   each wrapping a field store plus an optional [`Content`]
//! - **Enumerations** ([`method`], [`version`], [`status`]): [`Method`] /
//!   [`MethodSet`], [`Version`] and [`StatusCode`]
//! - **Errors** ([`error`]): [`HttpError`], [`ParseError`] and [`SendError`]
//!
//! Models serialize to and parse from the wire format directly; the
//! incremental chunk-at-a-time handling lives in [`crate::codec`] and the
//! per-connection sequencing in [`crate::connection`].

mod method;
pub use method::Method;
pub use method::MethodSet;

mod version;
pub use version::Version;

mod status;
pub use status::StatusCode;

mod fields;
pub use fields::Field;
pub use fields::FieldStore;

mod request;
pub use request::Content;
pub use request::Request;

mod response;
pub use response::Response;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
