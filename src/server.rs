//! HTTP server and graceful shutdown.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Timeouts live here, not in the router: a client gets
//! [`Config::read_timeout`] to send the request head, and the middleware plus
//! handler get [`Config::request_timeout`] to answer before the server
//! replies `503 Service Unavailable` on their behalf. Bodies longer than
//! [`Config::max_body_bytes`] are refused with `413 Payload Too Large`
//! before any middleware runs.
//!
//! Each request runs on its own spawned task. When the deadline passes the
//! client gets its 503 at once, but the task is detached, not cancelled: a
//! handler that has already written to a database or sent an email is left
//! to finish, so its side effects are never cut off halfway. A handler that
//! panics is answered with a 500.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Body;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::request::{BodyError, Request};
use crate::response::Response;
use crate::router::App;

/// The HTTP server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    config: Config,
}

impl Server {
    /// Configures the server to bind to `addr`, with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use trellis::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, config: Config { bind: addr.to_string(), ..Config::default() } }
    }

    /// Configures the server from a validated [`Config`].
    pub fn with_config(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let addr = config.bind_addr()?;
        Ok(Self { addr, config })
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Accepts a [`Router`](crate::Router) too; it is built first.
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, app: impl Into<App>) -> Result<(), Error> {
        let app: App = app.into();
        let listener = TcpListener::bind(self.addr).await?;
        let request_timeout = self.config.request_timeout();
        let max_body = self.config.max_body_bytes;

        let mut conn = ConnBuilder::new(TokioExecutor::new());
        conn.http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.read_timeout());
        let conn = Arc::new(conn);

        info!(addr = %self.addr, routes = app.routes(), "trellis listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even if more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = app.clone();
                    let conn = Arc::clone(&conn);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let app = app.clone();
                            async move { dispatch(app, req, max_body, request_timeout).await }
                        });

                        if let Err(e) = conn.serve_connection(io, svc).await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("trellis stopped");
        Ok(())
    }
}

/// Buffers one request, runs it through the app, and converts the result.
///
/// Every failure becomes a response, so hyper never sees an error.
async fn dispatch<B>(
    app: App,
    req: http::Request<B>,
    max_body: usize,
    timeout: Duration,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let req = match Request::from_body(req, max_body).await {
        Ok(req) => req,
        Err(e @ BodyError::TooLarge { .. }) => {
            warn!("{e}");
            return Ok(Response::status(StatusCode::PAYLOAD_TOO_LARGE).into_inner());
        }
        Err(e) => {
            warn!("failed to read request body: {e}");
            return Ok(Response::bad_request().into_inner());
        }
    };

    Ok(respond_within(&app, req, timeout).await.into_inner())
}

/// Runs `req` through `app` on a task of its own and waits at most `timeout`.
///
/// A late task is detached, not aborted, and finishes in the background.
async fn respond_within(app: &App, req: Request, timeout: Duration) -> Response {
    let app = app.clone();
    let task = tokio::spawn(async move { app.call(req).await });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => {
            error!("request task failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            warn!(?timeout, "request timed out, handler left running");
            Response::status(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
