//! The demonstration API.
//!
//! | Route | Shows |
//! |---|---|
//! | `GET /filters` | a validation filter that short-circuits with 400 |
//! | `POST /upload-file` | one multipart file copied to a temp file |
//! | `POST /upload-files` | every multipart file copied to temp files |
//! | `GET /search` | a repeated query key bound to an ordered list |
//! | `GET /search-as-parameter` | the query string bound to a record |
//! | `GET /short-circuiting` | a filter that always answers in place of the handler |
//!
//! Every route is traced.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{Chain, Filter, Next};
use crate::handler::{BoxFuture, Handler};
use crate::method::Method;
use crate::middleware;
use crate::request::Request;
use crate::response::{IntoOutcome, Json, Response};
use crate::router::Router;
use crate::upload::TempStore;

/// Query marker `/filters` insists on.
pub const REQUIRED_MARKER: &str = "ValidFormatAndValueKey";

/// Builds the demo router. Uploads go under `config.upload_root`.
pub fn router(config: &Config) -> Router {
    let store = Arc::new(TempStore::new(&config.upload_root));

    Router::new()
        .route(
            Method::Get,
            "/filters",
            traced(secret).filter(middleware::require_query(REQUIRED_MARKER)),
        )
        .route(Method::Post, "/upload-file", traced(with_store(Arc::clone(&store), upload_file)))
        .route(Method::Post, "/upload-files", traced(with_store(store, upload_files)))
        .route(Method::Get, "/search", traced(search))
        .route(
            Method::Get,
            "/search-as-parameter",
            traced(search_as_parameter).filter(middleware::bind_query::<Book>()),
        )
        .route(
            Method::Get,
            "/short-circuiting",
            traced(never_executed).filter(ShortCircuit),
        )
}

fn traced(handler: impl Handler) -> Chain {
    Chain::new(handler).filter(middleware::trace())
}

/// Adapts a handler that needs the upload store into a plain one.
fn with_store<F, Fut>(store: Arc<TempStore>, f: F) -> impl Handler
where
    F: Fn(Arc<TempStore>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Json<&'static str>>> + Send + 'static,
{
    move |req: Request| f(Arc::clone(&store), req)
}

// ── Filters ───────────────────────────────────────────────────────────────────

async fn secret(req: Request) -> Result<&'static str> {
    if req.query("secretKey").is_none() {
        return Err(Error::BadRequest("missing query parameter `secretKey`".into()));
    }
    Ok("Using filters with Minimal Api's")
}

// ── Uploads ───────────────────────────────────────────────────────────────────

async fn upload_file(store: Arc<TempStore>, req: Request) -> Result<Json<&'static str>> {
    let mut multipart = req.multipart()?;
    while let Some(field) = multipart.next_field().await? {
        if is_file(&field) {
            store.save_field("upload", field).await?;
            return Ok(Json("File sent successfully"));
        }
    }
    Err(Error::BadRequest("no file field in form".into()))
}

async fn upload_files(store: Arc<TempStore>, req: Request) -> Result<Json<&'static str>> {
    let mut multipart = req.multipart()?;
    while let Some(field) = multipart.next_field().await? {
        if is_file(&field) {
            store.save_field("uploads", field).await?;
        }
    }
    Ok(Json("Files sent successfully"))
}

/// A part is a file only when it names one; browsers send `filename=""`
/// for a file input left empty.
fn is_file(field: &multer::Field<'_>) -> bool {
    field.file_name().is_some_and(|name| !name.is_empty())
}

// ── Binding ───────────────────────────────────────────────────────────────────

async fn search(req: Request) -> Result<Json<String>> {
    let names = req.query_all("something");
    if names.is_empty() {
        return Err(Error::BadRequest("missing query parameter `something`".into()));
    }
    Ok(Json(format!("Names: {}", names.join(", "))))
}

/// Query record for `/search-as-parameter`. `Title` and `Author` are
/// required and may not be blank; `Year` defaults to 0.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Book {
    #[serde(deserialize_with = "non_blank")]
    pub author: String,
    #[serde(deserialize_with = "non_blank")]
    pub title: String,
    #[serde(default)]
    pub year: i32,
}

fn non_blank<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    let value = String::deserialize(de)?;
    if value.trim().is_empty() {
        return Err(serde::de::Error::custom("value must not be blank"));
    }
    Ok(value)
}

async fn search_as_parameter(req: Request) -> Result<String> {
    let book = req
        .extensions()
        .get::<Book>()
        .ok_or_else(|| Error::BadRequest("book parameters were not bound".into()))?;
    Ok(format!("Book: {}, {}, {}", book.title, book.author, book.year))
}

// ── Short-circuiting ──────────────────────────────────────────────────────────

/// Answers every request itself; nothing behind it ever runs.
pub struct ShortCircuit;

impl Filter for ShortCircuit {
    fn invoke(&self, _req: Request, _next: Next) -> BoxFuture<Result<Response>> {
        Box::pin(async { Json(json!({ "Short": "Circuit" })).into_outcome() })
    }
}

async fn never_executed(_req: Request) -> &'static str {
    "It'll never be executed"
}
