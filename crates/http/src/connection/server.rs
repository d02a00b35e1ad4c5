//! Server-side connection driver.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

use crate::codec::insert_content;
use crate::connection::{Outcome, ServerConfig, Session, WireResponse};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Response, SendError, StatusCode};

/// One accepted connection, driven to completion by [`process`].
///
/// The driver is a single task owning reader, writer and [`Session`]; all
/// phases of one connection run strictly sequentially, so the machine
/// needs no locking and the in-flight-send counter is a plain field of
/// this actor. Across connections the shared [`ServerConfig`] is read-only
/// and freely clonable behind its `Arc`.
///
/// [`process`]: ServerConnection::process
#[derive(Debug)]
pub struct ServerConnection<R, W> {
    reader: R,
    writer: W,
    session: Session,
    config: Arc<ServerConfig>,
    sends_in_flight: usize,
}

impl<R, W> ServerConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: Arc<ServerConfig>) -> Self {
        Self { reader, writer, session: Session::new(Arc::clone(&config)), config, sends_in_flight: 0 }
    }

    /// Runs the connection until the peer disconnects, the idle timeout
    /// fires, or the session requests teardown.
    ///
    /// Each received chunk is fed to the session; a completed request is
    /// handed to `handler`, whose response is framed and transmitted before
    /// the next receive is issued. A failing handler is opaque to the
    /// engine: the peer sees a synthesized `500` reply.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let mut buf = BytesMut::with_capacity(8 * 1024);
        loop {
            buf.clear();
            let n = match timeout(self.config.idle_timeout(), self.reader.read_buf(&mut buf)).await {
                Err(_elapsed) => {
                    info!("connection idle past the timeout, closing");
                    if let Some(wire) = self.session.timeout_reply() {
                        self.transmit(&wire).await?;
                    }
                    break;
                }
                Ok(Ok(0)) => {
                    debug!("peer closed the connection");
                    break;
                }
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ParseError::io(e).into()),
            };
            trace!(bytes = n, "chunk received");

            let outcome = self.session.feed(&buf[..n]);

            if let Some(interim) = self.session.take_interim() {
                self.writer.write_all(&interim).await.map_err(SendError::io)?;
                self.writer.flush().await.map_err(SendError::io)?;
            }

            match outcome {
                Outcome::NeedMore => {}
                Outcome::Dispatch(request) => {
                    let wire = match handler.call(request).await {
                        Ok(response) => self.session.respond(response),
                        Err(e) => {
                            error!(cause = %e, "handler failed, answering with a synthesized error");
                            self.session.respond(Response::new(StatusCode::INTERNAL_SERVER_ERROR))
                        }
                    };
                    self.transmit(&wire).await?;
                }
                Outcome::Reply(wire) => self.transmit(&wire).await?,
            }

            // teardown only once no send is in flight
            if self.session.should_close() && self.sends_in_flight == 0 {
                debug!("close requested, tearing the connection down");
                break;
            }
        }

        if let Err(e) = self.writer.shutdown().await {
            debug!(cause = %e, "error shutting down the writer");
        }
        Ok(())
    }

    /// Assembles head plus body into one transmit frame and writes it out.
    async fn transmit(&mut self, wire: &WireResponse) -> Result<(), HttpError> {
        self.sends_in_flight += 1;

        let capacity = wire.head.len() + wire.body.as_ref().map_or(0, |body| body.len());
        let mut frame = BytesMut::with_capacity(capacity);
        frame.extend_from_slice(&wire.head);
        if let Some(body) = &wire.body {
            let inserted = insert_content(&mut frame, capacity, body);
            debug_assert!(inserted.complete);
        }

        let written = self.writer.write_all(&frame).await;
        let flushed = match written {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        self.sends_in_flight -= 1;

        flushed.map_err(SendError::io)?;
        trace!(bytes = frame.len(), close = wire.close, "response transmitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex, split};

    use super::*;
    use crate::handler::{BoxError, make_handler};
    use crate::protocol::{Content, Request};

    fn fixed_date() -> Bytes {
        Bytes::from_static(b"Thu, 01 Jan 1970 00:00:00 GMT")
    }

    fn test_config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig::new().with_date_source(fixed_date))
    }

    async fn hello(_request: Request) -> Result<Response, BoxError> {
        let mut response = Response::new(StatusCode::OK);
        response.set_content(Some(Content::new(&b"hello"[..]).with_media_type("text/plain")));
        Ok(response)
    }

    /// Writes `chunks` to a fresh connection and returns everything the
    /// server sent back before teardown.
    async fn exchange(config: Arc<ServerConfig>, chunks: &[&[u8]]) -> String {
        let (client, server) = duplex(16 * 1024);
        let (server_read, server_write) = split(server);
        let connection = ServerConnection::new(server_read, server_write, config);
        let task = tokio::spawn(connection.process(Arc::new(make_handler(hello))));

        let (mut client_read, mut client_write) = split(client);
        for chunk in chunks {
            client_write.write_all(chunk).await.unwrap();
            client_write.flush().await.unwrap();
        }

        let mut out = Vec::new();
        client_read.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn get_round_trip_with_close() {
        let reply =
            exchange(test_config(), &[b"GET /x HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n"]).await;

        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "reply was: {reply}");
        assert!(reply.contains("Date: Thu, 01 Jan 1970 00:00:00 GMT\r\n"));
        assert!(reply.contains("Content-Length: 5\r\n"));
        assert!(reply.contains("Content-Type: text/plain\r\n"));
        assert!(reply.contains("Connection: close\r\n"));
        assert!(reply.ends_with("\r\n\r\nhello"));
    }

    #[tokio::test]
    async fn header_split_across_chunks() {
        let reply = exchange(
            test_config(),
            &[b"GET /x HTTP/1.1\r\nHos", b"t: h\r\nConnection: close\r\n\r\n"],
        )
        .await;
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "reply was: {reply}");
    }

    #[tokio::test]
    async fn missing_host_answers_400() {
        let reply = exchange(test_config(), &[b"GET /x HTTP/1.1\r\n\r\n"]).await;
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"), "reply was: {reply}");
        assert!(reply.contains("Connection: close\r\n"));
        assert!(reply.contains("<p>400 Bad Request</p>"));
    }

    #[tokio::test]
    async fn head_sends_no_body_bytes() {
        let reply =
            exchange(test_config(), &[b"HEAD /x HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n"]).await;
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "reply was: {reply}");
        assert!(reply.contains("Content-Length: 5\r\n"));
        assert!(reply.ends_with("\r\n\r\n"), "no body bytes may follow the head");
    }

    #[tokio::test]
    async fn echo_body_received_in_pieces() {
        let echo = |request: Request| async move {
            let mut request = request;
            let content = request.take_content().expect("content expected");
            let mut response = Response::new(StatusCode::OK);
            response.set_content(Some(Content::new(content.into_data())));
            Ok::<_, BoxError>(response)
        };

        let (client, server) = duplex(16 * 1024);
        let (server_read, server_write) = split(server);
        let connection = ServerConnection::new(server_read, server_write, test_config());
        let task = tokio::spawn(connection.process(Arc::new(make_handler(echo))));

        let (mut client_read, mut client_write) = split(client);
        client_write
            .write_all(b"POST /e HTTP/1.1\r\nHost: h\r\nConnection: close\r\nContent-Length: 6\r\n\r\nab")
            .await
            .unwrap();
        client_write.write_all(b"cdef").await.unwrap();

        let mut out = Vec::new();
        client_read.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();

        let reply = String::from_utf8(out).unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "reply was: {reply}");
        assert!(reply.ends_with("\r\n\r\nabcdef"));
    }

    #[tokio::test]
    async fn idle_timeout_mid_exchange_answers_408() {
        let config = Arc::new(
            ServerConfig::new().with_date_source(fixed_date).with_idle_timeout(Duration::from_millis(50)),
        );

        let (client, server) = duplex(16 * 1024);
        let (server_read, server_write) = split(server);
        let connection = ServerConnection::new(server_read, server_write, config);
        let task = tokio::spawn(connection.process(Arc::new(make_handler(hello))));

        let (mut client_read, mut client_write) = split(client);
        // half a request line, then silence
        client_write.write_all(b"GET /x HT").await.unwrap();

        let mut out = Vec::new();
        client_read.read_to_end(&mut out).await.unwrap();
        task.await.unwrap().unwrap();

        let reply = String::from_utf8(out).unwrap();
        assert!(reply.starts_with("HTTP/1.1 408 Request Timeout\r\n"), "reply was: {reply}");
    }

    #[tokio::test]
    async fn keep_alive_serves_sequential_requests() {
        let (client, server) = duplex(16 * 1024);
        let (server_read, server_write) = split(server);
        let connection = ServerConnection::new(server_read, server_write, test_config());
        let task = tokio::spawn(connection.process(Arc::new(make_handler(hello))));

        let (mut client_read, mut client_write) = split(client);

        client_write.write_all(b"GET /a HTTP/1.1\r\nHost: h\r\n\r\n").await.unwrap();
        let mut first = vec![0u8; 1024];
        let n = client_read.read(&mut first).await.unwrap();
        let first = String::from_utf8_lossy(&first[..n]).into_owned();
        assert!(first.starts_with("HTTP/1.1 200 OK\r\n"), "first reply was: {first}");

        client_write.write_all(b"GET /b HTTP/1.1\r\nHost: h\r\nConnection: close\r\n\r\n").await.unwrap();
        let mut rest = Vec::new();
        client_read.read_to_end(&mut rest).await.unwrap();
        task.await.unwrap().unwrap();

        let second = String::from_utf8(rest).unwrap();
        assert!(second.starts_with("HTTP/1.1 200 OK\r\n"), "second reply was: {second}");
        assert!(second.contains("Connection: close\r\n"));
    }
}
