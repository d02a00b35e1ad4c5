//! Client-side connection driver.
//!
//! [`ClientConnection`] wraps an established stream and exposes one
//! operation: [`send`], which transmits a [`Request`] and blocks (in the
//! async sense) until the peer's [`Response`] has been fully received.
//! Exchanges are strictly sequential; the connection stays reusable for
//! the next `send` until the server signals `Connection: close`, the peer
//! disconnects, or a receive times out.
//!
//! [`send`]: ClientConnection::send

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::DEFAULT_MAX_HEADER_BYTES;
use crate::codec::{HeaderScan, extract_content, extract_header};
use crate::protocol::{Content, Method, ParseError, Request, Response};
use crate::utils::ensure;

/// Errors a client exchange can fail with. Any failure other than a
/// malformed response leaves the connection unusable for further sends.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("timed out awaiting the response")]
    TimedOut,

    #[error("peer closed the connection before the response completed")]
    PeerClosed,

    #[error("connection is no longer reusable")]
    NotReusable,

    #[error("malformed response: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// A client-side connection over an established bidirectional stream.
#[derive(Debug)]
pub struct ClientConnection<S> {
    stream: S,
    max_header_bytes: usize,
    recv_timeout: Option<Duration>,
    reusable: bool,
}

impl<S> ClientConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self { stream, max_header_bytes: DEFAULT_MAX_HEADER_BYTES, recv_timeout: None, reusable: true }
    }

    /// Bounds how long a single receive may wait for peer data. Without
    /// one, [`send`](Self::send) waits indefinitely.
    #[must_use]
    pub fn with_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = Some(recv_timeout);
        self
    }

    /// Hard capacity for the accumulated response header block.
    #[must_use]
    pub fn with_max_header_bytes(mut self, max_header_bytes: usize) -> Self {
        self.max_header_bytes = max_header_bytes;
        self
    }

    /// Whether another [`send`](Self::send) may be issued.
    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    /// Performs one request/response exchange.
    ///
    /// The request is framed and written out, then received chunks are fed
    /// through the header scanner and the content extractor until the
    /// response is complete. A `HEAD` request never waits for body bytes,
    /// whatever `Content-Length` the response advertises.
    pub async fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        ensure!(self.reusable, ClientError::NotReusable);

        let frame = encode_request(request);
        trace!(bytes = frame.len(), "request framed");
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        let mut acc = BytesMut::new();
        let mut buf = BytesMut::with_capacity(8 * 1024);
        let mut body = BytesMut::new();
        loop {
            let n = self.recv(&mut buf).await?;
            match extract_header(&mut acc, &buf[..n], self.max_header_bytes) {
                HeaderScan::Complete { consumed } => {
                    body.extend_from_slice(&buf[consumed..n]);
                    break;
                }
                HeaderScan::Partial { consumed: _ } => {
                    ensure!(
                        acc.len() < self.max_header_bytes,
                        ParseError::too_large_header(acc.len(), self.max_header_bytes).into()
                    );
                }
                HeaderScan::Nul => return Err(ParseError::EmbeddedNul.into()),
            }
        }

        let mut response = Response::parse(&acc)?;
        if response.fields().wants_close() {
            debug!("server signalled close, connection is no longer reusable");
            self.reusable = false;
        }

        // a HEAD reply advertises a length but never carries the bytes
        let expected = if request.method() == Method::Head {
            0
        } else {
            response.fields().content_length()?.unwrap_or(0)
        };

        if expected > 0 {
            body.truncate(expected);
            while body.len() < expected {
                let n = self.recv(&mut buf).await?;
                extract_content(&mut body, expected, &buf[..n]);
            }
            let media_type = response.fields().get("Content-Type").map(str::to_owned);
            let mut content = Content::new(body.freeze());
            if let Some(media_type) = media_type {
                content = content.with_media_type(media_type);
            }
            response.set_content(Some(content));
        }

        trace!(status = %response.status(), "response received");
        Ok(response)
    }

    /// One receive, bounded by the configured timeout. EOF and timeout
    /// both poison the connection.
    async fn recv(&mut self, buf: &mut BytesMut) -> Result<usize, ClientError> {
        buf.clear();
        let n = match self.recv_timeout {
            Some(limit) => match timeout(limit, self.stream.read_buf(buf)).await {
                Ok(read) => read?,
                Err(_elapsed) => {
                    self.reusable = false;
                    return Err(ClientError::TimedOut);
                }
            },
            None => self.stream.read_buf(buf).await?,
        };
        if n == 0 {
            self.reusable = false;
            return Err(ClientError::PeerClosed);
        }
        Ok(n)
    }
}

/// Serializes the full request frame: request line, caller fields,
/// auto-derived `Content-Length`/`Content-Type` where content is present
/// and the caller did not set them, blank line, content bytes.
fn encode_request(request: &Request) -> Bytes {
    let content = request.content();
    let mut frame =
        BytesMut::with_capacity(256 + 32 * request.fields().len() + content.map_or(0, Content::len));

    frame.put_slice(request.method().as_str().as_bytes());
    frame.put_slice(b" ");
    frame.put_slice(request.target().as_bytes());
    frame.put_slice(b" ");
    frame.put_slice(request.version().as_str().as_bytes());
    frame.put_slice(b"\r\n");
    request.fields().encode(&mut frame);

    if let Some(content) = content {
        if request.fields().get("Content-Length").is_none() {
            frame.put_slice(b"Content-Length: ");
            frame.put_slice(content.len().to_string().as_bytes());
            frame.put_slice(b"\r\n");
        }
        if request.fields().get("Content-Type").is_none() {
            if let Some(media_type) = content.media_type() {
                frame.put_slice(b"Content-Type: ");
                frame.put_slice(media_type.as_bytes());
                frame.put_slice(b"\r\n");
            }
        }
    }

    frame.put_slice(b"\r\n");
    if let Some(content) = content {
        frame.put_slice(content.data());
    }
    frame.freeze()
}
