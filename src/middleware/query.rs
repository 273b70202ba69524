//! Query-string validation and binding filters.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::filter::{Filter, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Short-circuits with `400 Bad Request` unless the raw query string
/// contains `marker`.
///
/// The check is a plain substring match on the undecoded query, so the
/// marker may appear as a key, a value, or part of either.
pub fn require_query(marker: impl Into<String>) -> impl Filter {
    let marker = marker.into();
    move |req: Request, next: Next| {
        let present = req.query_string().contains(marker.as_str());
        async move {
            if !present {
                debug!(path = req.path(), "required query marker missing");
                return Ok(Response::status(Status::BadRequest));
            }
            next.run(req).await
        }
    }
}

/// Binds the query string to `T` before anything downstream runs.
///
/// On success the record is stored in the request extensions, where the
/// handler reads it with `req.extensions().get::<T>()`. On failure the
/// request is answered with `400 Bad Request` and the binding error as text.
pub fn bind_query<T>() -> impl Filter
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    |mut req: Request, next: Next| async move {
        match req.query_as::<T>() {
            Ok(bound) => {
                req.extensions_mut().insert(bound);
                next.run(req).await
            }
            Err(e) => {
                debug!(path = req.path(), "query binding failed: {e}");
                Ok::<_, Error>(
                    Response::builder()
                        .status(Status::BadRequest)
                        .text(e.to_string()),
                )
            }
        }
    }
}
