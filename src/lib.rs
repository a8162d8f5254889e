//! # ruta
//!
//! A minimal request-routing and JSON body-ingestion layer for HTTP services,
//! with an in-memory record store exposed through it.
//!
//! The interesting parts live in three places: [`RouteTable`] (exact
//! method + path registration with validation), [`Dispatcher`] (404/405
//! policy, response helpers, the terminal handler-failure boundary), and
//! [`Body`] (a push-based chunk stream buffered to completion and parsed as
//! JSON, bounded by a byte cap and a timeout).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ruta::store::InMemoryUsers;
//! use ruta::{Dispatcher, Server, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryUsers::new());
//!     let dispatcher = Dispatcher::new(api::routes(store)?);
//!
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://{}", server.local_addr());
//!     server.run(dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod router;
pub mod server;
pub mod store;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use dispatch::{Dispatcher, Envelope, send_html, send_json};
pub use error::Error;
pub use http::{Body, BodySender, Headers, Method, ReadLimits, Request, Response, StatusCode};
pub use router::RouteTable;
pub use server::{Server, ServerError};
