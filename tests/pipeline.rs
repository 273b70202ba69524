//! Filter-chain behaviour through the public API.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use sluice::{
    Chain, Error, Method, Next, Request, Response, Router, Status, boxed, upload::TempStore,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn get(uri: &str) -> http::Request<Bytes> {
    http::Request::builder().uri(uri).body(Bytes::new()).unwrap()
}

fn step(log: &Log, name: &'static str) -> sluice::BoxedFilter {
    let log = Arc::clone(log);
    boxed(move |req: Request, next: Next| {
        log.lock().unwrap().push(name);
        next.run(req)
    })
}

#[tokio::test]
async fn listed_filters_run_in_order_each_once() {
    let log = Log::default();
    let handler_log = Arc::clone(&log);
    let chain = Chain::from_filters(
        move |_req: Request| {
            handler_log.lock().unwrap().push("H");
            async { "OK" }
        },
        vec![step(&log, "F1"), step(&log, "F2"), step(&log, "F3")],
    )
    .unwrap();

    let app = Router::new().route(Method::Get, "/ordered", chain);
    let res = app.handle(get("/ordered")).await;

    assert_eq!(res.body(), b"OK");
    assert_eq!(*log.lock().unwrap(), ["F1", "F2", "F3", "H"]);
}

#[tokio::test]
async fn rejection_prevents_the_handlers_file_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(TempStore::new(dir.path()));

    let writer = {
        let store = Arc::clone(&store);
        move |_req: Request| {
            let store = Arc::clone(&store);
            async move {
                store.create("written").await?;
                Ok::<_, Error>(Status::Created)
            }
        }
    };
    let reject = |req: Request, next: Next| async move {
        if req.query("allow").is_none() {
            return Ok(Response::status(Status::BadRequest));
        }
        next.run(req).await
    };

    let app = Router::new().route(Method::Get, "/write", Chain::new(writer).filter(reject));

    let res = app.handle(get("/write")).await;
    assert_eq!(res.status_code(), 400);
    assert!(!dir.path().join("written").exists());

    let res = app.handle(get("/write?allow=1")).await;
    assert_eq!(res.status_code(), 201);
    assert_eq!(std::fs::read_dir(dir.path().join("written")).unwrap().count(), 1);
}

#[tokio::test]
async fn same_filters_on_two_routes_stay_independent() {
    let log = Log::default();
    let shared = step(&log, "shared");

    let app = Router::new()
        .route(
            Method::Get,
            "/left",
            Chain::new(|_req: Request| async { "left" }).filter_boxed(Arc::clone(&shared)),
        )
        .route(
            Method::Get,
            "/right",
            Chain::new(|_req: Request| async { "right" }).filter_boxed(shared),
        );

    let (left, right) = tokio::join!(app.handle(get("/left")), app.handle(get("/right")));

    assert_eq!(left.body(), b"left");
    assert_eq!(right.body(), b"right");
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn post_processing_sees_the_handlers_response() {
    let app = Router::new().route(
        Method::Get,
        "/wrapped",
        Chain::new(|_req: Request| async { "inner" }).filter(|req: Request, next: Next| async move {
            let inner = next.run(req).await?;
            let body = String::from_utf8_lossy(inner.body()).into_owned();
            Ok::<_, Error>(Response::builder().status(Status::Accepted).text(format!("[{body}]")))
        }),
    );

    let res = app.handle(get("/wrapped")).await;

    assert_eq!(res.status_code(), 202);
    assert_eq!(res.body(), b"[inner]");
}

#[test]
fn empty_filter_list_fails_registration() {
    let res = Chain::from_filters(|_req: Request| async { "never" }, Vec::new());
    assert!(matches!(res, Err(Error::EmptyChain)));
}
