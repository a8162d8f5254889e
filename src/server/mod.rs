//! Async TCP server using Tokio.
//!
//! Accepts connections and runs each one through the dispatcher. Request
//! heads are parsed incrementally; the body is not pre-buffered — once the
//! head completes, the connection task streams exactly `Content-Length`
//! bytes into the request's body channel while the dispatcher runs
//! concurrently, so a handler awaiting [`Request::json`](crate::Request::json)
//! sees chunks in arrival order and socket failures as transport errors.
//! HTTP/1.1 persistent connections (keep-alive) are supported out of the box.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::http::body::{Body, BodySender, ReadLimits};
use crate::http::request::{Request, RequestError};
use crate::http::{Response, StatusCode};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a request head (request line + headers) we will buffer.
const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// Socket read chunk size while feeding a request body.
const BODY_CHUNK_SIZE: usize = 8 * 1024;

/// The TCP server.
///
/// Binds to an address and feeds every parsed request to a [`Dispatcher`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ruta::{Dispatcher, Server, api};
/// use ruta::store::InMemoryUsers;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(InMemoryUsers::new());
///     let dispatcher = Dispatcher::new(api::routes(store)?);
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.run(dispatcher).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    limits: ReadLimits,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
            limits: ReadLimits::default(),
        })
    }

    /// Replaces the body-collection limits applied to every request.
    #[must_use]
    pub fn body_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and dispatching requests.
    ///
    /// The dispatcher is shared across all spawned connection tasks. This
    /// method runs until the process is terminated or an unrecoverable
    /// listener error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn run(self, dispatcher: Dispatcher) -> Result<(), ServerError> {
        let dispatcher = Arc::new(dispatcher);
        info!(address = %self.local_addr, "listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let dispatcher = Arc::clone(&dispatcher);
            let limits = self.limits;

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, dispatcher, limits).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, serving one
/// request per iteration, until the peer closes the connection or signals
/// `Connection: close`.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    limits: ReadLimits,
) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Read until a complete request head is buffered.
        let (mut request, head_len) = loop {
            match Request::parse(&buf) {
                Ok(pair) => break pair,
                Err(RequestError::Incomplete) => {
                    if buf.len() > MAX_HEAD_SIZE {
                        warn!(peer = %peer_addr, "request head too large — sending 413");
                        return reject(
                            &mut stream,
                            StatusCode::PayloadTooLarge,
                            "Request entity too large",
                        )
                        .await;
                    }
                    let bytes_read = stream.read_buf(&mut buf).await?;
                    if bytes_read == 0 {
                        if !buf.is_empty() {
                            debug!(peer = %peer_addr, "connection closed mid-head");
                        }
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(peer = %peer_addr, error = %e, "bad request — sending 400");
                    return reject(&mut stream, StatusCode::BadRequest, &format!("Bad Request: {e}"))
                        .await;
                }
            }
        };

        let _ = buf.split_to(head_len);
        let content_length = request.content_length().unwrap_or(0);
        let keep_alive = request.is_keep_alive();

        let (sender, body) = Body::channel();
        request.set_body(body.with_limits(limits));

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            path = request.path(),
            "dispatching request"
        );

        // Feed the body and run the handler concurrently; a handler that
        // never reads the body must not stall the connection, and the body
        // must still be drained off the socket for keep-alive framing.
        let feed = feed_with_deadline(&mut stream, &mut buf, content_length, sender, limits.timeout);
        let dispatch = dispatcher.dispatch(request);
        let (fed, response) = tokio::join!(feed, dispatch);

        stream
            .write_all(&response.keep_alive(keep_alive).into_bytes())
            .await?;
        stream.flush().await?;
        fed?;

        if !keep_alive {
            debug!(peer = %peer_addr, "Connection: close — shutting down");
            break;
        }
    }

    Ok(())
}

/// Bounds the body feed with the same window the ingestion side applies, so
/// a peer that never delivers its declared `Content-Length` cannot pin the
/// connection task. On expiry the inner feed is dropped, which drops the
/// sender and ends the body stream for any handler still reading it.
async fn feed_with_deadline(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    remaining: usize,
    sender: BodySender,
    deadline: Duration,
) -> io::Result<()> {
    match tokio::time::timeout(deadline, feed_body(stream, buf, remaining, sender)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "request body was not delivered in time",
        )),
    }
}

/// Streams exactly `remaining` body bytes into `sender`: leftover buffered
/// bytes first, then socket reads. Socket failures are pushed into the body
/// as transport errors before being returned.
async fn feed_body(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    mut remaining: usize,
    sender: BodySender,
) -> io::Result<()> {
    if remaining == 0 {
        return Ok(());
    }

    // Bytes already read past the head belong to this body.
    if !buf.is_empty() {
        let take = remaining.min(buf.len());
        let chunk = buf.split_to(take).freeze();
        remaining -= take;
        let _ = sender.push(chunk);
    }

    let mut scratch = vec![0u8; BODY_CHUNK_SIZE];
    while remaining > 0 {
        let want = remaining.min(scratch.len());
        match stream.read(&mut scratch[..want]).await {
            Ok(0) => {
                sender.fail(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before the request body completed",
                ));
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before the request body completed",
                ));
            }
            Ok(bytes_read) => {
                remaining -= bytes_read;
                let _ = sender.push(Bytes::copy_from_slice(&scratch[..bytes_read]));
            }
            Err(e) => {
                sender.fail(io::Error::new(e.kind(), e.to_string()));
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Writes a terminal error response and signals the connection to close.
async fn reject(stream: &mut TcpStream, status: StatusCode, message: &str) -> io::Result<()> {
    let response = Response::new(status).body(message).keep_alive(false);
    stream.write_all(&response.into_bytes()).await?;
    stream.flush().await
}
