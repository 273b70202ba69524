//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Each leaf holds a frozen
//! filter chain; registering a route is the only moment a chain can change.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use matchit::Router as MatchitRouter;
use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::filter::{Chain, Endpoint};
use crate::handler::Handler;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Arc<Endpoint>>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a bare handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves them:
    ///
    /// ```rust,no_run
    /// # use sluice::{Method, Request, Response, Router};
    /// # async fn search(_: Request) -> Response { Response::text("") }
    /// # async fn get_book(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::Get, "/books/{id}", get_book)
    ///     .on(Method::Get, "/search",     search);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or already-registered path.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method, path, Chain::new(handler))
    }

    /// Register a handler behind an ordered list of filters.
    ///
    /// ```rust,no_run
    /// # use sluice::{middleware, Chain, Method, Request, Router};
    /// # async fn secret(_: Request) -> &'static str { "" }
    /// Router::new().route(
    ///     Method::Get,
    ///     "/filters",
    ///     Chain::new(secret)
    ///         .filter(middleware::trace())
    ///         .filter(middleware::require_query("ValidFormatAndValueKey")),
    /// );
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on an invalid or already-registered path.
    pub fn route(self, method: Method, path: &str, chain: Chain) -> Self {
        self.try_route(method, path, chain)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Non-panicking form of [`Router::route`].
    pub fn try_route(mut self, method: Method, path: &str, chain: Chain) -> Result<Self> {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, chain.freeze())
            .map_err(|e| Error::Route { path: path.to_owned(), reason: e.to_string() })?;
        Ok(self)
    }

    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(Arc<Endpoint>, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let endpoint = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((endpoint, params))
    }

    /// Routes one buffered request and produces exactly one response.
    ///
    /// Routes are looked up per method, so a known path requested with a
    /// method it was not registered for answers `404`, the same as an unknown
    /// path. `405` is reserved for methods outside RFC 9110. `HEAD` is its own
    /// method and does not fall back to a `GET` route.
    ///
    /// This is also the outer error layer: an `Err` that escapes a chain is
    /// logged and turned into a response here.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let Ok(method) = req.method().as_str().parse::<Method>() else {
            return Response::status(Status::MethodNotAllowed);
        };

        let Some((endpoint, params)) = self.lookup(method, req.uri().path()) else {
            return Response::status(Status::NotFound);
        };

        let path = req.uri().path().to_owned();
        match endpoint.run(Request::from_http(method, req, params)).await {
            Ok(response) => response,
            Err(e) => {
                if e.status().is_client_error() {
                    warn!(%method, %path, "request rejected: {e}");
                } else {
                    error!(%method, %path, "request failed: {e}");
                }
                e.into_response()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
