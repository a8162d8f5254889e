//! HTTP/1.1 request head parsing using the [`httparse`] crate.

use thiserror::Error;

use super::body::Body;
use super::{Headers, Method};
use crate::error;

/// Errors that can occur while parsing an HTTP/1.1 request head.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete — more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// A parsed HTTP/1.1 request.
///
/// [`Request::parse`] consumes the head (request line + headers) from a raw
/// byte buffer; the body arrives separately as a streaming [`Body`] attached
/// by the connection handler. Handlers obtain the parsed JSON payload via
/// [`Request::json`].
///
/// # Examples
///
/// ```
/// use ruta::http::request::Request;
///
/// let raw = b"GET /api/v1/users HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, head_len) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/api/v1/users");
/// assert_eq!(head_len, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    body: Body,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Parse a raw HTTP/1.1 request head from a byte slice.
    ///
    /// Returns the parsed `Request` (with an empty body — see
    /// [`Request::set_body`]) and the byte offset at which the body begins in
    /// `buf`, immediately after the `\r\n\r\n` header terminator.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] — more data is needed to complete the head.
    /// - [`RequestError::Parse`] — the data is malformed and cannot be parsed.
    /// - [`RequestError::MissingField`] — method, path, or version is absent.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let head_len = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse()
            .unwrap(); // Infallible

        let path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?
            .to_owned();

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                body: Body::empty(),
            },
            head_len,
        ))
    }

    /// Constructs an HTTP/1.1 request directly, without wire parsing.
    ///
    /// Useful for driving a dispatcher from tests or in-process callers.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            version: 1,
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    /// Attaches a body stream, replacing the current one.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Builder form of [`Request::set_body`].
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.set_body(body);
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw request target path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Buffers the body stream to completion and parses it as JSON.
    ///
    /// This is the body-ingestion entry point for route handlers; see
    /// [`Body::read_json`] for the failure contract.
    pub async fn json(&mut self) -> Result<serde_json::Value, error::Error> {
        self.body.read_json().await
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// HTTP/1.1 defaults to keep-alive. HTTP/1.0 defaults to close unless
    /// `Connection: keep-alive` is explicitly set.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(conn) => conn.eq_ignore_ascii_case("keep-alive"),
            None => self.version == 1, // HTTP/1.1 default: keep-alive
        }
    }

    /// Returns the value of the `Content-Length` header parsed as a `usize`, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET /api/v1/users HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, head_len) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/api/v1/users");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(head_len, raw.len());
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn keep_alive_http11_default() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(req.is_keep_alive());
    }

    #[test]
    fn connection_close() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn content_length() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let (req, head_len) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&raw[head_len..], b"hello");
    }

    #[tokio::test]
    async fn json_reads_the_attached_body() {
        let mut req = Request::new(Method::Post, "/api/v1/users")
            .with_body(Body::from_bytes(&br#"{"name":"Ada"}"#[..]));
        let value = req.json().await.unwrap();
        assert_eq!(value["name"], "Ada");
    }
}
