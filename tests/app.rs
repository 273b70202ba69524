//! End-to-end checks of the demonstration API through `Router::handle`.

use bytes::Bytes;
use sluice::{Config, Response, Router, app};

fn demo(upload_root: &std::path::Path) -> Router {
    app::router(&Config { upload_root: upload_root.to_path_buf(), ..Config::default() })
}

fn get(uri: &str) -> http::Request<Bytes> {
    http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
}

const BOUNDARY: &str = "sluice-test-boundary";

/// `(field name, file name, contents)`; a `None` file name is a plain field.
fn multipart(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> http::Request<Bytes> {
    let mut body = String::new();
    for (name, file_name, contents) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file_name {
            Some(file_name) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(contents);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Bytes::from(body))
        .unwrap()
}

fn text(res: &Response) -> &str {
    std::str::from_utf8(res.body()).unwrap()
}

fn stored_files(dir: &std::path::Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut contents: Vec<String> = entries
        .map(|e| std::fs::read_to_string(e.unwrap().path()).unwrap())
        .collect();
    contents.sort();
    contents
}

#[tokio::test]
async fn filters_route_requires_the_marker() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(get("/filters?secretKey=abc")).await;
    assert_eq!(res.status_code(), 400);
    assert!(res.body().is_empty());

    let res = app.handle(get("/filters")).await;
    assert_eq!(res.status_code(), 400);

    let res = app.handle(get("/filters?secretKey=ValidFormatAndValueKey")).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(text(&res), "Using filters with Minimal Api's");
}

#[tokio::test]
async fn filters_route_still_needs_secret_key_once_past_the_filter() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(get("/filters?other=ValidFormatAndValueKey")).await;
    assert_eq!(res.status_code(), 400);
    assert!(text(&res).contains("secretKey"));
}

#[tokio::test]
async fn short_circuit_route_never_reaches_its_handler() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    for uri in ["/short-circuiting", "/short-circuiting?anything=1"] {
        let res = app.handle(get(uri)).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(text(&res), r#"{"Short":"Circuit"}"#);
    }
}

#[tokio::test]
async fn search_keeps_repeated_values_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(get("/search?something=a&something=b&something=c")).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(text(&res), r#""Names: a, b, c""#);

    let res = app.handle(get("/search")).await;
    assert_eq!(res.status_code(), 400);
}

#[tokio::test]
async fn search_as_parameter_binds_a_book() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(get("/search-as-parameter?Title=T&Author=A&Year=2024")).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(text(&res), "Book: T, A, 2024");

    for uri in [
        "/search-as-parameter?Title=T&Year=2024",
        "/search-as-parameter?Author=A&Year=2024",
        "/search-as-parameter?Title=&Author=A",
        "/search-as-parameter?Title=T&Author=A&Year=soon",
    ] {
        let res = app.handle(get(uri)).await;
        assert_eq!(res.status_code(), 400, "{uri}");
        assert!(!text(&res).starts_with("Book:"), "{uri}");
    }
}

#[tokio::test]
async fn single_upload_lands_in_upload_folder() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let req = multipart(
        "/upload-file",
        &[("note", None, "ignored"), ("file", Some("a.txt"), "first file")],
    );
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), 200);
    assert_eq!(text(&res), r#""File sent successfully""#);
    assert_eq!(stored_files(&dir.path().join("upload")), ["first file"]);
}

#[tokio::test]
async fn single_upload_without_a_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(multipart("/upload-file", &[("note", None, "no file")])).await;

    assert_eq!(res.status_code(), 400);
    assert!(stored_files(&dir.path().join("upload")).is_empty());
}

#[tokio::test]
async fn multi_upload_stores_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let req = multipart(
        "/upload-files",
        &[
            ("files", Some("one.txt"), "alpha"),
            ("files", Some("two.txt"), "beta"),
            ("files", Some("three.txt"), "gamma"),
        ],
    );
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), 200);
    assert_eq!(text(&res), r#""Files sent successfully""#);
    assert_eq!(stored_files(&dir.path().join("uploads")), ["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn upload_without_multipart_body_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let req = http::Request::builder()
        .method("POST")
        .uri("/upload-file")
        .header("content-type", "application/json")
        .body(Bytes::from_static(b"{}"))
        .unwrap();
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), 400);
    assert!(!dir.path().join("upload").exists());
}

#[tokio::test]
async fn truncated_upload_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\n\
         partial-bytes-no-closing-boundary"
    );
    let req = http::Request::builder()
        .method("POST")
        .uri("/upload-file")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Bytes::from(body))
        .unwrap();
    let res = app.handle(req).await;

    assert_eq!(res.status_code(), 400);
    assert!(stored_files(&dir.path().join("upload")).is_empty());
}

#[tokio::test]
async fn empty_file_input_is_not_an_upload() {
    let dir = tempfile::tempdir().unwrap();
    let app = demo(dir.path());

    let res = app.handle(multipart("/upload-file", &[("file", Some(""), "")])).await;
    assert_eq!(res.status_code(), 400);
    assert!(stored_files(&dir.path().join("upload")).is_empty());

    let req = multipart(
        "/upload-files",
        &[("files", Some(""), ""), ("files", Some("kept.txt"), "kept")],
    );
    let res = app.handle(req).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(stored_files(&dir.path().join("uploads")), ["kept"]);
}
