//! Request dispatch — resolve `(method, path)` to a handler or to a 404/405.
//!
//! The [`Dispatcher`] consults its route table and either invokes the
//! matching handler, answers `405 Method Not Allowed` with an `Allow` header
//! when the path is registered under other methods, or answers a `404` HTML
//! page when the path is unknown. A handler failure is caught here — the
//! single terminal boundary — and converted into a 500 JSON body; handlers
//! never need their own fallback.
//!
//! The module also owns the response helpers: [`send_html`] with its coarse
//! well-formedness check, and [`send_json`], which takes the wire status from
//! the envelope's own `code` field.

mod envelope;

pub use envelope::Envelope;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, warn};

use crate::error::Error;
use crate::http::{Request, Response, StatusCode};
use crate::router::RouteTable;

// Shallow structural check, not a parser: one opening and one closing tag
// anywhere in the payload. Callers rely on this staying permissive.
static OPENING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[a-z].*>").expect("opening-tag pattern"));
static CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)</[a-z].*>").expect("closing-tag pattern"));

/// Resolves inbound requests against an owned route table.
///
/// # Examples
///
/// ```
/// use ruta::{Dispatcher, RouteTable};
/// use ruta::dispatch::{Envelope, send_json};
/// use ruta::http::{Method, Request};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), ruta::Error> {
/// let mut table = RouteTable::new();
/// table.get("/ping", |_req| async {
///     Ok(send_json(&Envelope::ok(json!("pong"))))
/// })?;
///
/// let dispatcher = Dispatcher::new(table);
/// let response = dispatcher.dispatch(Request::new(Method::Get, "/ping")).await;
/// assert_eq!(response.status().as_u16(), 200);
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    table: RouteTable,
}

impl Dispatcher {
    /// Creates a dispatcher over `table`.
    ///
    /// The table is owned and immutable from here on; registration must be
    /// complete before serving begins.
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Resolves `request` and returns the response to serialize.
    ///
    /// Resolution order:
    ///
    /// 1. Exact `(method, path)` match — invoke the handler and await it.
    ///    A handler `Err` is logged and answered as 500 `{"error": …}`.
    /// 2. Path registered under other methods — 405 with an `Allow` header
    ///    listing them in registration order, body `{"error":"Method Not Allowed"}`.
    /// 3. Unknown path — 404 with the HTML body `<h1>404 Not Found</h1>`.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_owned();

        if let Some(route) = self.table.find(&method, &path) {
            debug!(method = %method, path = %path, "dispatching to handler");
            match (route.handler())(request).await {
                Ok(response) => response,
                Err(err) => {
                    error!(method = %method, path = %path, error = %err, "handler failed");
                    error_response(StatusCode::InternalServerError, &err.to_string())
                }
            }
        } else if self.table.path_exists(&path) {
            let allow = self
                .table
                .allowed_methods(&path)
                .iter()
                .map(|m| m.as_str().to_owned())
                .collect::<Vec<_>>()
                .join(", ");
            debug!(method = %method, path = %path, allow = %allow, "method not allowed");
            error_response(StatusCode::MethodNotAllowed, "Method Not Allowed")
                .header("Allow", allow)
        } else {
            debug!(method = %method, path = %path, "no route registered");
            send_html(StatusCode::NotFound, "<h1>404 Not Found</h1>")
        }
    }
}

/// Builds a `text/html` response after a shallow well-formedness check.
///
/// The payload must be non-empty and contain at least one opening and one
/// closing tag. On failure the HTML path converts into a 500 JSON error
/// response — the caller still gets a well-formed answer, just not the one
/// it asked for.
pub fn send_html(status: StatusCode, html: &str) -> Response {
    match validate_html(html) {
        Ok(()) => Response::new(status)
            .header("Content-Type", "text/html")
            .body(html),
        Err(err) => {
            warn!(error = %err, "HTML payload rejected");
            error_response(StatusCode::InternalServerError, &err.to_string())
        }
    }
}

/// Serializes `envelope` as an `application/json` response.
///
/// The wire status line comes from the envelope's own `code` field.
/// A serialization failure converts into a 500 JSON error response rather
/// than propagating.
pub fn send_json(envelope: &Envelope) -> Response {
    match serde_json::to_string(envelope) {
        Ok(payload) => Response::new(envelope.status_code())
            .header("Content-Type", "application/json")
            .body(payload),
        Err(err) => {
            warn!(error = %err, "envelope serialization failed");
            let parse = Error::Parse(err.to_string());
            error_response(StatusCode::InternalServerError, &parse.to_string())
        }
    }
}

// The dispatcher's own error shape: a bare {"error": message} JSON body, as
// opposed to the structured envelope the API handlers answer with.
fn error_response(status: StatusCode, message: &str) -> Response {
    let payload = serde_json::json!({ "error": message });
    Response::new(status)
        .header("Content-Type", "application/json")
        .body(payload.to_string())
}

fn validate_html(html: &str) -> Result<(), Error> {
    if html.trim().is_empty() {
        return Err(Error::InvalidHtml("HTML content cannot be empty"));
    }
    if !OPENING_TAG.is_match(html) || !CLOSING_TAG.is_match(html) {
        return Err(Error::InvalidHtml(
            "expected at least one opening and one closing tag",
        ));
    }
    Ok(())
}
