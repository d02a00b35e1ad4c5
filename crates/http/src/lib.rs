//! An embeddable HTTP/1.x message engine.
//!
//! The crate provides the protocol plumbing for one connection at a time:
//! incremental header scanning and length-bounded content transfer over
//! arbitrarily split chunks ([`codec`]), message models whose field names
//! keep their received casing and order ([`protocol`]), a per-connection
//! state machine with an async server driver ([`connection`]), and a
//! sequential client driver ([`client`]). Listening, accepting and
//! connection spawning stay with the embedding application.
//!
//! A minimal server:
//!
//! ```no_run
//! use std::error::Error;
//! use std::sync::Arc;
//!
//! use nano_http::connection::{ServerConfig, ServerConnection};
//! use nano_http::handler::{BoxError, make_handler};
//! use nano_http::protocol::{Content, Request, Response, StatusCode};
//! use tokio::net::TcpListener;
//!
//! async fn hello(_request: Request) -> Result<Response, BoxError> {
//!     let mut response = Response::new(StatusCode::OK);
//!     response.set_content(Some(Content::new(&b"Hello World!"[..]).with_media_type("text/plain")));
//!     Ok(response)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = Arc::new(ServerConfig::new());
//!     let handler = Arc::new(make_handler(hello));
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let (reader, writer) = stream.into_split();
//!         let connection = ServerConnection::new(reader, writer, Arc::clone(&config));
//!         let handler = Arc::clone(&handler);
//!         tokio::spawn(async move {
//!             if let Err(e) = connection.process(handler).await {
//!                 tracing::warn!(cause = %e, "connection failed");
//!             }
//!         });
//!     }
//! }
//! ```

pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;

/// Upper bound on the number of fields a parsed header block may carry.
pub(crate) const MAX_HEADER_NUM: usize = 64;

/// Default capacity for an accumulated header block.
pub(crate) const DEFAULT_MAX_HEADER_BYTES: usize = 8 * 1024;
