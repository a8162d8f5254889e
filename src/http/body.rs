//! Streaming request body ingestion.
//!
//! A [`Body`] is the receiving end of an ordered chunk stream. Chunks are
//! appended in arrival order, the stream completes when its [`BodySender`]
//! is dropped, and the whole payload is buffered before parsing — there is
//! no partial delivery to the caller. Collection is bounded by
//! [`ReadLimits`]: a byte cap and a wall-clock timeout.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::error::Error;

/// Caps applied while collecting a request body.
#[derive(Debug, Clone, Copy)]
pub struct ReadLimits {
    /// Maximum number of body bytes buffered before the read fails.
    pub max_bytes: usize,
    /// Maximum wall-clock time to wait for the stream to complete.
    pub timeout: Duration,
}

impl ReadLimits {
    pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

type ChunkEvent = Result<Bytes, io::Error>;

/// Push side of a request body stream.
///
/// Dropping the sender signals end of stream to the reading [`Body`].
#[derive(Debug)]
pub struct BodySender {
    tx: mpsc::UnboundedSender<ChunkEvent>,
}

impl BodySender {
    /// Pushes one chunk. Returns `false` when the receiving body was dropped,
    /// which a producer may ignore — it still has to drain its source.
    pub fn push(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.send(Ok(chunk.into())).is_ok()
    }

    /// Terminates the stream with a transport-level error.
    pub fn fail(&self, error: io::Error) {
        let _ = self.tx.send(Err(error));
    }
}

/// A per-request body stream, collected once and in full.
///
/// # Examples
///
/// ```
/// use ruta::http::Body;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sender, mut body) = Body::channel();
/// sender.push(&b"{\"key\":"[..]);
/// sender.push(&b"\"value\"}"[..]);
/// drop(sender);
///
/// let value = body.read_json().await.unwrap();
/// assert_eq!(value["key"], "value");
/// # }
/// ```
#[derive(Debug)]
pub struct Body {
    rx: mpsc::UnboundedReceiver<ChunkEvent>,
    limits: ReadLimits,
}

impl Body {
    /// Creates a connected sender/body pair with default limits.
    pub fn channel() -> (BodySender, Body) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            BodySender { tx },
            Body {
                rx,
                limits: ReadLimits::default(),
            },
        )
    }

    /// A body whose stream is already complete and empty.
    pub fn empty() -> Body {
        Body::channel().1
    }

    /// A body whose stream delivers `bytes` as a single chunk, then completes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Body {
        let (sender, body) = Body::channel();
        sender.push(bytes.into());
        body
    }

    /// Replaces the collection limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ReadLimits) -> Body {
        self.limits = limits;
        self
    }

    /// Collects the stream to completion and returns the concatenated bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] — the stream reported a transport failure.
    /// - [`Error::TooLarge`] — accumulation exceeded the byte cap.
    /// - [`Error::TimedOut`] — the stream did not complete in time.
    pub async fn read_to_end(&mut self) -> Result<Bytes, Error> {
        let ReadLimits { max_bytes, timeout } = self.limits;
        let collect = async {
            let mut buf = BytesMut::new();
            while let Some(event) = self.rx.recv().await {
                let chunk = event.map_err(|e| Error::Transport(e.to_string()))?;
                if buf.len() + chunk.len() > max_bytes {
                    return Err(Error::TooLarge { max_bytes });
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(buf.freeze())
        };

        match tokio::time::timeout(timeout, collect).await {
            Ok(result) => result,
            Err(_) => Err(Error::TimedOut(timeout)),
        }
    }

    /// Collects the stream and parses it as a single JSON value of any shape.
    ///
    /// Resolves or fails exactly once per call: the stream is consumed either
    /// way, and a second call sees an already-completed, empty stream.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] when the payload is empty, whitespace-only, or not
    /// syntactically valid JSON, plus everything [`Body::read_to_end`] can
    /// fail with.
    pub async fn read_json(&mut self) -> Result<serde_json::Value, Error> {
        let raw = self.read_to_end().await?;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Parse("unexpected end of input".to_owned()));
        }
        serde_json::from_slice(&raw).map_err(|e| Error::Parse(e.to_string()))
    }
}
