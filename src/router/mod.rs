//! The route table — ordered `(method, path, handler)` registrations.
//!
//! Matching identity is the exact `(method, path)` pair: no path parameters,
//! no wildcards, no trailing-slash normalization. Routes are appended in
//! registration order and never removed; when the same pair is registered
//! twice, lookup returns the first entry.
//!
//! Paths are validated on registration: non-empty, starting with `/`, and
//! containing only `[A-Za-z0-9\-_/]`. A bad path fails the registration call
//! itself, so misconfigured tables never reach serving.

use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::http::{Method, Request, Response};

/// Type-erased, heap-allocated async handler.
///
/// Handlers receive the [`Request`] (including its body stream) and return a
/// [`Response`] or fail; a failure is caught by the dispatcher's terminal
/// boundary. Stored behind `Arc<dyn Fn(…)>` so routes can be shared across
/// tasks without copying the underlying closure. You never construct this
/// type directly — registration goes through [`RouteTable::get`],
/// [`RouteTable::post`], and the other method helpers.
pub type Handler = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>
        + Send
        + Sync
        + 'static,
>;

/// Conversion trait for async handler functions.
///
/// Any `Fn(Request) -> impl Future<Output = Result<Response, Error>> + Send`
/// that is also `Send + Sync + 'static` implements this automatically via the
/// blanket impl below. The bound is the compile-time form of "a handler must
/// be invocable with the request": a non-callable simply does not register.
pub trait IntoHandler: Send + Sync + 'static {
    /// Call the handler with the given request, boxing the returned future.
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>;
}

impl<T, F> IntoHandler for T
where
    T: Fn(Request) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn call(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>> {
        Box::pin((self)(request))
    }
}

/// A single registered route binding a method + path to a handler.
pub struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

impl Route {
    /// Returns the route's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the route's exact path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// An append-only, ordered collection of routes.
///
/// # Examples
///
/// ```
/// use ruta::{Error, RouteTable};
/// use ruta::http::{Response, StatusCode};
///
/// # fn main() -> Result<(), Error> {
/// let mut table = RouteTable::new();
/// table.get("/health", |_req| async {
///     Ok(Response::new(StatusCode::Ok).body("ok"))
/// })?;
///
/// assert_eq!(table.len(), 1);
/// assert!(table.path_exists("/health"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates a new, empty table with no registered routes.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a handler for `GET` requests on `path`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] when `path` violates the module-level invariant.
    pub fn get(&mut self, path: &str, handler: impl IntoHandler) -> Result<(), Error> {
        self.add(Method::Get, path, handler)
    }

    /// Registers a handler for `POST` requests on `path`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] when `path` violates the module-level invariant.
    pub fn post(&mut self, path: &str, handler: impl IntoHandler) -> Result<(), Error> {
        self.add(Method::Post, path, handler)
    }

    /// Registers a handler for `PUT` requests on `path`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] when `path` violates the module-level invariant.
    pub fn put(&mut self, path: &str, handler: impl IntoHandler) -> Result<(), Error> {
        self.add(Method::Put, path, handler)
    }

    /// Registers a handler for `DELETE` requests on `path`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] when `path` violates the module-level invariant.
    pub fn delete(&mut self, path: &str, handler: impl IntoHandler) -> Result<(), Error> {
        self.add(Method::Delete, path, handler)
    }

    // Validate, erase the concrete handler type, and append.
    fn add(&mut self, method: Method, path: &str, handler: impl IntoHandler) -> Result<(), Error> {
        validate_path(path)?;
        let handler: Handler = Arc::new(move |request| handler.call(request));
        self.routes.push(Route {
            method,
            path: path.to_owned(),
            handler,
        });
        Ok(())
    }

    /// Returns the first route whose `(method, path)` equals the input exactly.
    pub fn find(&self, method: &Method, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| &route.method == method && route.path == path)
    }

    /// Returns `true` if any route, regardless of method, is registered on `path`.
    ///
    /// This is what separates a 404 (unknown path) from a 405 (known path,
    /// wrong method).
    pub fn path_exists(&self, path: &str) -> bool {
        self.routes.iter().any(|route| route.path == path)
    }

    /// Returns the methods registered for `path`, in registration order.
    ///
    /// Duplicate registrations yield duplicate entries; the caller joins the
    /// result verbatim into a 405 `Allow` header.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|route| route.path == path)
            .map(|route| route.method.clone())
            .collect()
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes have been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn validate_path(path: &str) -> Result<(), Error> {
    let reason = if path.is_empty() {
        Some("path cannot be empty")
    } else if !path.starts_with('/') {
        Some("path must start with /")
    } else if !path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
    {
        Some("path contains invalid characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidPath {
            path: path.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}
