//! HTTP server and graceful shutdown.
//!
//! [`Server::serve`] stops on SIGTERM or Ctrl-C. [`Server::serve_with_shutdown`]
//! takes any future instead, which is how tests and embedding programs stop
//! it. Either way the listener is closed first and every connection already
//! accepted is allowed to finish before the call returns.
//!
//! hyper drops a request's future when its connection goes away. A filter
//! chain suspended at that moment never resumes, so no later filter and no
//! handler runs for a client that has already left.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Parses a `host:port` string.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string. Use
    /// [`Server::new`] with an already-parsed address to avoid that.
    ///
    /// ```rust,no_run
    /// use sluice::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, router: Router) -> Result<()> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves, then drains.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %listener.local_addr()?, "sluice listening");
        accept_until(listener, router, signal).await;
        info!("sluice stopped");
        Ok(())
    }
}

/// The accept loop. Returns once `signal` has fired and every spawned
/// connection has closed.
async fn accept_until(listener: TcpListener, router: Router, signal: impl Future<Output = ()>) {
    let router = Arc::new(router);
    let mut connections = JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            biased;

            () = &mut signal => {
                info!(in_flight = connections.len(), "stopping, draining connections");
                break;
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    connections.spawn(connection(stream, peer, Arc::clone(&router)));
                }
                Err(e) => warn!("accept failed: {e}"),
            },

            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    while connections.join_next().await.is_some() {}
}

/// Drives one TCP connection, HTTP/1.1 or HTTP/2 as negotiated.
async fn connection(stream: TcpStream, peer: SocketAddr, router: Arc<Router>) {
    let svc = service_fn(move |req| dispatch(Arc::clone(&router), req, peer));
    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(stream), svc)
        .await
    {
        debug!(%peer, "connection closed with error: {e}");
    }
}

/// Buffers the body, then hands the request to the router. Every failure is
/// already a response by the time hyper sees it.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> std::result::Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let response = match body.collect().await {
        Ok(collected) => {
            router.handle(http::Request::from_parts(parts, collected.to_bytes())).await
        }
        Err(e) => {
            debug!(%peer, "failed to read request body: {e}");
            Response::status(Status::BadRequest)
        }
    };
    Ok(response.into_http())
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it. A handler
/// that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
