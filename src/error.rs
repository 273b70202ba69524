//! Unified error type.

use thiserror::Error;

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// Shorthand used across the crate and by filters.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by sluice's fallible operations.
///
/// Expected rejections (a missing query marker, a failed binding) are plain
/// [`Response`] values returned by a filter. `Error` is for everything that
/// breaks the chain instead: storage I/O, a malformed multipart body, a
/// misconfigured route. It travels back through every `next` caller until
/// the router turns it into a response.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("multipart: {0}")]
    Multipart(#[from] multer::Error),

    #[error("query: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("config: {0}")]
    Config(String),

    #[error("invalid route `{path}`: {reason}")]
    Route { path: String, reason: String },

    #[error("filter chain for this route has no filters; register it with `Router::on` instead")]
    EmptyChain,
}

impl Error {
    /// Status the outer layer answers with when this error escapes a chain.
    pub fn status(&self) -> Status {
        match self {
            Self::Multipart(_) | Self::Query(_) | Self::BadRequest(_) => Status::BadRequest,
            _ => Status::InternalServerError,
        }
    }
}

/// Client errors carry their message; server errors never leak internals.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.status() {
            Status::BadRequest => Response::builder()
                .status(Status::BadRequest)
                .text(self.to_string()),
            status => Response::builder()
                .status(status)
                .text("internal server error"),
        }
    }
}
