//! Per-request tracing filter.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::filter::{Filter, Next};
use crate::request::Request;

/// Wraps the rest of the chain in a `request` span and logs the outcome.
///
/// Put it first so the span covers every later filter and the handler. A
/// short-circuit further down is still logged with its status.
pub fn trace() -> impl Filter {
    |req: Request, next: Next| {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        async move {
            let started = Instant::now();
            let result = next.run(req).await;
            let latency_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(res) => info!(status = res.status_code(), latency_ms, "request completed"),
                Err(e) => warn!(error = %e, latency_ms, "request failed"),
            }
            result
        }
        .instrument(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::filter::Chain;
    use crate::request::fixture;
    use crate::response::Response;
    use crate::status::Status;

    #[tokio::test]
    async fn passes_the_handler_response_through_untouched() {
        let endpoint = Chain::new(|_req: Request| async {
            Response::builder().status(Status::Created).header("x-id", "7").text("made")
        })
        .filter(trace())
        .freeze();

        let res = endpoint.run(fixture("/things")).await.unwrap();

        assert_eq!(res.status_code(), 201);
        assert_eq!(res.header("x-id"), Some("7"));
        assert_eq!(res.body(), b"made");
    }

    #[tokio::test]
    async fn reports_a_short_circuit_downstream() {
        let endpoint = Chain::new(|_req: Request| async { "unreachable" })
            .filter(trace())
            .filter(|_req: Request, _next: Next| async {
                Ok::<_, Error>(Response::status(Status::BadRequest))
            })
            .freeze();

        let res = endpoint.run(fixture("/gate")).await.unwrap();

        assert_eq!(res.status_code(), 400);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn hands_errors_back_unchanged() {
        let endpoint = Chain::new(|_req: Request| async {
            Err::<&'static str, _>(Error::BadRequest("nope".into()))
        })
        .filter(trace())
        .freeze();

        let res = endpoint.run(fixture("/")).await;

        assert!(matches!(res, Err(Error::BadRequest(msg)) if msg == "nope"));
    }
}
