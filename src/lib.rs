//! # sluice
//!
//! Per-route request filters with short-circuit semantics, on a minimal
//! hyper host.
//!
//! ## The contract
//!
//! A route is an ordered chain: filters in the order you registered them,
//! then the handler. Each filter gets the request and a [`Next`]. It can
//! pass the request on, answer in place of everything behind it, or attach
//! state and post-process whatever comes back. Chains are frozen when they
//! are registered; nothing changes them while the server runs.
//!
//! What the host owns, so filters don't have to:
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - HTTP/1.1 and HTTP/2 via hyper, bodies buffered before routing
//! - Translating escaped [`Error`]s into 400 / 500 responses
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! TLS, body-size limits and rate limiting belong to the reverse proxy in
//! front.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sluice::{middleware, Chain, Method, Next, Request, Response, Router, Server, Status};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .on(Method::Get, "/search", search)
//!         .route(
//!             Method::Get,
//!             "/admin",
//!             Chain::new(admin)
//!                 .filter(middleware::trace())
//!                 .filter(require_token),
//!         );
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn require_token(req: Request, next: Next) -> sluice::Result<Response> {
//!     if req.header("x-token").is_none() {
//!         return Ok(Response::status(Status::Unauthorized));
//!     }
//!     next.run(req).await
//! }
//!
//! async fn search(req: Request) -> String {
//!     format!("Names: {}", req.query_all("name").join(", "))
//! }
//!
//! async fn admin(_req: Request) -> &'static str {
//!     "welcome"
//! }
//! ```

mod error;
mod filter;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod config;
pub mod middleware;
pub mod upload;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{BoxedFilter, Chain, Filter, Next, boxed};
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use request::Request;
pub use response::{ContentType, IntoOutcome, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
