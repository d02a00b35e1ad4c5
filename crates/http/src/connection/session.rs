//! Per-connection protocol state machine.
//!
//! A [`Session`] owns one connection's lifecycle on the server side. It is
//! deliberately free of I/O: the driver hands it raw received chunks via
//! [`Session::feed`] and gets back either "need more data", a fully
//! received [`Request`] to dispatch, or an already framed reply. Once the
//! application handler produced a [`Response`], [`Session::respond`] frames
//! it into wire bytes.
//!
//! The phase is a sum type carrying exactly the partial data that phase
//! needs, so states like "content cursor while awaiting a request" cannot
//! be constructed. Every detected protocol error funnels through the same
//! path: a preset status code, the close flag, and a well-formed framed
//! reply — nothing is thrown across the machine boundary.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::{HeaderScan, extract_content, extract_header};
use crate::connection::ServerConfig;
use crate::protocol::{Content, Method, Request, Response, StatusCode};

/// A framed response ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// Serialized status line, fields and blank-line terminator.
    pub head: Bytes,
    /// Body bytes, absent for bodiless replies and for `HEAD` exchanges.
    pub body: Option<Bytes>,
    /// Whether the connection must be torn down after this send completes.
    pub close: bool,
}

/// What the driver should do after feeding a chunk.
#[derive(Debug)]
pub enum Outcome {
    /// The message is still incomplete; await the next chunk.
    NeedMore,
    /// A full request was received and is in the supported-method set:
    /// invoke the application handler, then call [`Session::respond`].
    Dispatch(Request),
    /// The machine framed a reply on its own (protocol error or
    /// unsupported method): transmit it as-is.
    Reply(WireResponse),
}

#[derive(Debug)]
enum Phase {
    /// Accumulating header bytes until the terminator.
    ReceiveHeader { acc: BytesMut },
    /// Header parsed; accumulating `expected` content bytes.
    ReceiveBody { request: Request, media_type: Option<String>, body: BytesMut, expected: usize },
    /// Request handed to the application; awaiting [`Session::respond`].
    AwaitHandler { method: Method },
    /// Terminal: the exchange is over and the connection closes.
    AwaitClose,
}

enum Step {
    Ready(Request),
    Body { request: Request, media_type: Option<String>, expected: usize },
}

/// Server-side protocol state machine for a single connection.
#[derive(Debug)]
pub struct Session {
    config: Arc<ServerConfig>,
    phase: Phase,
    close: bool,
    interim: Option<Bytes>,
}

impl Session {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config, phase: Phase::ReceiveHeader { acc: BytesMut::new() }, close: false, interim: None }
    }

    /// Whether the connection must be torn down once pending sends finish.
    pub fn should_close(&self) -> bool {
        self.close
    }

    /// Takes the staged interim reply (`100 Continue`), if any. The driver
    /// must transmit it before awaiting further chunks.
    pub fn take_interim(&mut self) -> Option<Bytes> {
        self.interim.take()
    }

    /// Feeds one received chunk into the machine.
    ///
    /// The whole chunk is consumed: header bytes into the scan
    /// accumulator, body bytes into the content accumulator, anything
    /// beyond the current exchange discarded (pipelining is unsupported).
    pub fn feed(&mut self, mut chunk: &[u8]) -> Outcome {
        loop {
            let phase = std::mem::replace(&mut self.phase, Phase::AwaitClose);
            match phase {
                Phase::ReceiveHeader { mut acc } => {
                    match extract_header(&mut acc, chunk, self.config.max_header_bytes()) {
                        HeaderScan::Complete { consumed } => {
                            chunk = &chunk[consumed..];
                            let request = match Request::parse(&acc) {
                                Ok(request) => request,
                                Err(e) => {
                                    warn!(cause = %e, "malformed request header");
                                    return self.protocol_error(StatusCode::BAD_REQUEST);
                                }
                            };
                            match self.process_header(request) {
                                Ok(Step::Ready(request)) => return self.start_response(request, chunk),
                                Ok(Step::Body { request, media_type, expected }) => {
                                    trace!(expected, "receiving request content");
                                    self.phase = Phase::ReceiveBody {
                                        request,
                                        media_type,
                                        body: BytesMut::with_capacity(expected),
                                        expected,
                                    };
                                }
                                Err(status) => return self.protocol_error(status),
                            }
                        }
                        HeaderScan::Partial { consumed: _ } => {
                            if acc.len() >= self.config.max_header_bytes() {
                                warn!(
                                    accumulated = acc.len(),
                                    limit = self.config.max_header_bytes(),
                                    "request header exceeds the configured capacity"
                                );
                                return self.protocol_error(StatusCode::PAYLOAD_TOO_LARGE);
                            }
                            self.phase = Phase::ReceiveHeader { acc };
                            return Outcome::NeedMore;
                        }
                        HeaderScan::Nul => {
                            warn!("NUL byte inside the request header");
                            return self.protocol_error(StatusCode::BAD_REQUEST);
                        }
                    }
                }

                Phase::ReceiveBody { mut request, media_type, mut body, expected } => {
                    let transfer = extract_content(&mut body, expected, chunk);
                    chunk = &chunk[transfer.consumed..];
                    if transfer.complete {
                        let mut content = Content::new(body.freeze());
                        if let Some(media_type) = media_type {
                            content = content.with_media_type(media_type);
                        }
                        request.set_content(Some(content));
                        return self.start_response(request, chunk);
                    }
                    self.phase = Phase::ReceiveBody { request, media_type, body, expected };
                    return Outcome::NeedMore;
                }

                Phase::AwaitHandler { method } => {
                    self.phase = Phase::AwaitHandler { method };
                    if !chunk.is_empty() {
                        warn!(bytes = chunk.len(), "discarding bytes received while a response is pending");
                    }
                    return Outcome::NeedMore;
                }

                // input after the exchange ended is discarded
                Phase::AwaitClose => return Outcome::NeedMore,
            }
        }
    }

    /// Frames the handler's response. Must follow an [`Outcome::Dispatch`].
    pub fn respond(&mut self, response: Response) -> WireResponse {
        let head_only = match &self.phase {
            Phase::AwaitHandler { method } => *method == Method::Head,
            _ => {
                warn!("respond called outside the dispatch phase");
                false
            }
        };
        self.finish(response, head_only)
    }

    /// Invoked by the driver when the idle timeout fired. Mid-exchange the
    /// peer is owed a `408`; between requests the connection just closes.
    pub fn timeout_reply(&mut self) -> Option<WireResponse> {
        let mid_exchange = match &self.phase {
            Phase::ReceiveHeader { acc } => !acc.is_empty(),
            Phase::ReceiveBody { .. } => true,
            Phase::AwaitHandler { .. } | Phase::AwaitClose => false,
        };
        self.close = true;
        if mid_exchange {
            debug!("idle timeout mid-exchange, answering 408");
            Some(self.finish(Response::new(StatusCode::REQUEST_TIMEOUT), false))
        } else {
            self.phase = Phase::AwaitClose;
            None
        }
    }

    /// Header semantics: mandatory `Host`, close detection, content
    /// length/type resolution, `Expect: 100-continue` staging.
    fn process_header(&mut self, request: Request) -> Result<Step, StatusCode> {
        if request.fields().get("Host").is_none() {
            warn!("request without the mandatory Host field");
            return Err(StatusCode::BAD_REQUEST);
        }

        if request.fields().wants_close() {
            debug!("peer requested close after this exchange");
            self.close = true;
        }

        let expected = match request.fields().content_length() {
            Ok(length) => length.unwrap_or(0),
            Err(e) => {
                warn!(cause = %e, "unparseable Content-Length");
                return Err(StatusCode::BAD_REQUEST);
            }
        };
        if expected == 0 {
            return Ok(Step::Ready(request));
        }

        if let Some(value) = request.fields().get("Expect") {
            if value.trim().eq_ignore_ascii_case("100-continue") {
                debug!("staging interim 100 Continue before the content");
                self.interim = Some(Bytes::from_static(b"HTTP/1.1 100 Continue\r\n\r\n"));
            }
        }

        let media_type = request.fields().get("Content-Type").map(str::to_owned);
        Ok(Step::Body { request, media_type, expected })
    }

    /// Dispatch gate: methods outside the configured set never reach the
    /// application, the machine fabricates the `501` itself.
    fn start_response(&mut self, request: Request, leftover: &[u8]) -> Outcome {
        if !leftover.is_empty() {
            warn!(bytes = leftover.len(), "discarding pipelined bytes");
        }
        let method = request.method();
        if !self.config.methods().contains(method) {
            debug!(method = %method, "method outside the supported set");
            let wire = self.finish(Response::new(StatusCode::NOT_IMPLEMENTED), method == Method::Head);
            return Outcome::Reply(wire);
        }
        self.phase = Phase::AwaitHandler { method };
        Outcome::Dispatch(request)
    }

    /// The single error-propagation path: preset status, close flag, a
    /// well-formed framed reply.
    fn protocol_error(&mut self, status: StatusCode) -> Outcome {
        self.close = true;
        let wire = self.finish(Response::new(status), false);
        Outcome::Reply(wire)
    }

    /// PROCESS_RESPONSE: stamps `Date`, picks the handler's content or the
    /// synthesized error page, sets `Content-Length`/`Content-Type`,
    /// suppresses body bytes for `HEAD`, serializes the head and advances
    /// the phase to the next exchange or to teardown.
    fn finish(&mut self, mut response: Response, head_only: bool) -> WireResponse {
        let date = self.config.date();
        response.fields_mut().set("Date", String::from_utf8_lossy(&date).into_owned());

        let (data, media_type) = match response.take_content() {
            Some(content) => {
                let media_type = content.media_type().map(str::to_owned);
                (content.into_data(), media_type)
            }
            None if !response.status().is_success() => {
                (error_page(response.status()), Some("text/html".to_owned()))
            }
            None => (Bytes::new(), None),
        };

        response.fields_mut().set("Content-Length", data.len().to_string());
        if let Some(media_type) = media_type {
            response.fields_mut().set("Content-Type", media_type);
        }
        if self.close {
            response.fields_mut().set("Connection", "close");
        }

        let mut head = BytesMut::with_capacity(256 + 32 * response.fields().len());
        response.encode(&mut head);
        trace!(status = %response.status(), close = self.close, head_only, "response framed");

        self.phase = if self.close {
            Phase::AwaitClose
        } else {
            Phase::ReceiveHeader { acc: BytesMut::new() }
        };

        let body = if head_only || data.is_empty() { None } else { Some(data) };
        WireResponse { head: head.freeze(), body, close: self.close }
    }
}

/// Default HTML error body with the status code and phrase substituted
/// twice.
fn error_page(status: StatusCode) -> Bytes {
    let code = status.as_u16();
    let reason = status.reason();
    Bytes::from(format!(
        "<html><head><title>{code} {reason}</title></head><body><p>{code} {reason}</p></body></html>"
    ))
}
