//! Built-in filters.
//!
//! Filters intercept requests and responses on a single route and are the
//! right place for cross-cutting concerns: structured tracing, request
//! validation, and binding query data before the handler runs.
//!
//! - [`trace`] — per-request span with method, path, status, latency
//! - [`require_query`] — rejects requests whose query string lacks a marker
//! - [`bind_query`] — binds the query string to a record for the handler

mod query;
mod trace;

pub use query::{bind_query, require_query};
pub use trace::trace;
