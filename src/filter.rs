//! Per-route filter chains.
//!
//! A route is a [`Chain`]: filters in registration order followed by the
//! route's handler. When a request matches, the router starts a [`Next`] at
//! the first filter and every filter decides for itself what happens next:
//!
//! ```text
//!   request ─▶ F1 ─next─▶ F2 ─next─▶ … ─next─▶ handler
//!                │          │
//!                │          └─ returns early: short-circuit, nothing after F2 runs
//!                └─ awaits next, then inspects or rewrites the response
//! ```
//!
//! A filter has three valid shapes:
//!
//! - **pass-through**: `next.run(req).await`
//! - **short-circuit**: return a response without touching `next`
//! - **augment**: attach state to `req.extensions_mut()` or post-process the
//!   response `next` returned
//!
//! `Next` is consumed by [`Next::run`], so a filter can advance the chain at
//! most once and never revisit an earlier link. Errors returned by any link
//! travel back through every filter that awaited `next`; filters are not
//! expected to catch them.
//!
//! # Writing a filter
//!
//! Closures work directly:
//!
//! ```rust
//! use sluice::{Next, Request, Response, Status};
//!
//! let require_json = |req: Request, next: Next| async move {
//!     if req.header("content-type") != Some("application/json") {
//!         return Ok(Response::status(Status::UnsupportedMediaType));
//!     }
//!     next.run(req).await
//! };
//! # let _ = sluice::Chain::new(|_req: Request| async { "ok" }).filter(require_json);
//! ```
//!
//! Stateful filters implement [`Filter`] on their own type.

use std::future::Future;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// Something that can sit in front of a handler.
///
/// Implemented automatically for every
/// `Fn(Request, Next) -> impl Future<Output = Result<Response>>` closure.
pub trait Filter: Send + Sync + 'static {
    fn invoke(&self, req: Request, next: Next) -> BoxFuture<Result<Response>>;
}

impl<F, Fut> Filter for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn invoke(&self, req: Request, next: Next) -> BoxFuture<Result<Response>> {
        Box::pin(self(req, next))
    }
}

/// A type-erased filter, shareable across routes.
pub type BoxedFilter = Arc<dyn Filter>;

/// Erase a filter so it can go into a list for [`Chain::from_filters`].
pub fn boxed(filter: impl Filter) -> BoxedFilter {
    Arc::new(filter)
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of filters in front of one handler.
///
/// Filters run in the order they were added. The chain is frozen when it is
/// registered on a [`Router`](crate::Router).
pub struct Chain {
    filters: Vec<BoxedFilter>,
    handler: BoxedHandler,
}

impl Chain {
    /// A chain with no filters yet. The handler is always the last link.
    pub fn new(handler: impl Handler) -> Self {
        Self { filters: Vec::new(), handler: handler.into_boxed_handler() }
    }

    /// Builds a chain from an explicit filter list.
    ///
    /// An empty list is a misconfiguration; register the handler with
    /// [`Router::on`](crate::Router::on) instead.
    pub fn from_filters(handler: impl Handler, filters: Vec<BoxedFilter>) -> Result<Self> {
        if filters.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self { filters, handler: handler.into_boxed_handler() })
    }

    /// Append a filter. Returns `self` for chaining.
    pub fn filter(mut self, filter: impl Filter) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append an already-erased filter, e.g. one shared with another route.
    pub fn filter_boxed(mut self, filter: BoxedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub(crate) fn freeze(self) -> Arc<Endpoint> {
        Arc::new(Endpoint {
            filters: self.filters.into_boxed_slice(),
            handler: self.handler,
        })
    }
}

// ── Endpoint ──────────────────────────────────────────────────────────────────

/// A frozen chain as stored in the routing table.
pub(crate) struct Endpoint {
    filters: Box<[BoxedFilter]>,
    handler: BoxedHandler,
}

impl Endpoint {
    /// One full traversal for one request.
    pub(crate) async fn run(self: Arc<Self>, req: Request) -> Result<Response> {
        Next { endpoint: self, cursor: 0 }.run(req).await
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The rest of the chain, handed to a filter for one invocation.
pub struct Next {
    endpoint: Arc<Endpoint>,
    cursor: usize,
}

impl Next {
    /// Runs the next filter, or the handler once every filter has passed.
    ///
    /// If the request future is dropped while a link is suspended (client
    /// disconnect), later links never start.
    pub async fn run(self, req: Request) -> Result<Response> {
        let Self { endpoint, cursor } = self;
        match endpoint.filters.get(cursor).cloned() {
            Some(filter) => {
                trace!(cursor, "entering filter");
                filter.invoke(req, Next { endpoint, cursor: cursor + 1 }).await
            }
            None => {
                trace!(filters = cursor, "entering handler");
                endpoint.handler.call(req).await
            }
        }
    }

    /// Number of links left after this point, handler included.
    pub fn remaining(&self) -> usize {
        self.endpoint.filters.len() - self.cursor + 1
    }
}
