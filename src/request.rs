//! Incoming HTTP request type — the invocation context of a filter chain.
//!
//! A `Request` is created by the router once per matched request and moved
//! link by link through the chain. User code cannot construct one, so a
//! filter can only hand the request it received to `next`; it can never
//! substitute a different one. Filters that need to pass data downstream
//! attach it to [`Request::extensions_mut`].

use std::collections::HashMap;
use std::convert::Infallible;

use bytes::Bytes;
use futures_util::stream;
use http::{Extensions, HeaderMap};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::method::Method;

/// An incoming HTTP request with its body already buffered.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: String,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    extensions: Extensions,
}

impl Request {
    pub(crate) fn from_http(
        method: Method,
        req: http::Request<Bytes>,
        params: HashMap<String, String>,
    ) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().unwrap_or_default().to_owned(),
            headers: parts.headers,
            body,
            params,
            extensions: parts.extensions,
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// The raw, still percent-encoded query string without the leading `?`.
    /// Empty when the URI has none.
    pub fn query_string(&self) -> &str { &self.query }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First decoded value for `key` in the query string.
    pub fn query(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Every decoded value for a repeated `key`, in the order they appear.
    ///
    /// `?something=a&something=b&something=c` yields `["a", "b", "c"]`.
    pub fn query_all(&self, key: &str) -> Vec<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    /// Binds the query string to a record.
    ///
    /// Fields without a `#[serde(default)]` are required: a missing key is a
    /// binding error. Numbers are parsed from their text form.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_urlencoded::from_str(&self.query)?)
    }

    /// Request-scoped state attached by upstream filters.
    pub fn extensions(&self) -> &Extensions { &self.extensions }

    /// Attach request-scoped state for downstream filters and the handler.
    ///
    /// The map lives and dies with this request.
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// Streams the buffered body as `multipart/form-data`.
    ///
    /// Fails with [`Error::BadRequest`] when there is no `content-type`
    /// header and with [`Error::Multipart`] when it carries no boundary.
    pub fn multipart(&self) -> Result<multer::Multipart<'static>> {
        let content_type = self
            .header("content-type")
            .ok_or_else(|| Error::BadRequest("expected a multipart/form-data body".into()))?;
        let boundary = multer::parse_boundary(content_type)?;
        let body = self.body.clone();
        let chunks = stream::once(async move { Ok::<_, Infallible>(body) });
        Ok(multer::Multipart::new(chunks, boundary))
    }
}

#[cfg(test)]
pub(crate) fn fixture(uri: &str) -> Request {
    let req = http::Request::builder()
        .uri(uri)
        .body(Bytes::new())
        .unwrap();
    Request::from_http(Method::Get, req, HashMap::new())
}
