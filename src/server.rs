//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections are made.
//! 2. Asking every open connection to finish its current request and close.
//! 3. Waiting up to the drain timeout for them to do so. Connections still
//!    open at the deadline are aborted; their requests may never be logged.
//!
//! Keep the drain timeout below `terminationGracePeriodSeconds`.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::handler::{BoxedHandler, ErasedHandler};
use crate::request::Request;

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HEADER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    drain_timeout: Duration,
    header_read_timeout: Duration,
}

impl Server {
    /// Binds a listener on `addr`. Port `0` picks a free port; see
    /// [`local_addr`](Server::local_addr).
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            header_read_timeout: DEFAULT_HEADER_READ_TIMEOUT,
        })
    }

    /// How long shutdown waits for in-flight connections.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// How long an HTTP/1 client has to send its request headers.
    pub fn header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `app` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, app: BoxedHandler) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Serves `app` until `signal` resolves, then drains.
    pub async fn serve_with_shutdown(
        self,
        app: BoxedHandler,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let addr = self.listener.local_addr()?;
        info!(%addr, "vigil listening");

        // Flipped to `true` once; every connection task watches it.
        let (draining_tx, draining_rx) = watch::channel(false);
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = app.clone();
                    let mut draining = draining_rx.clone();
                    let header_read_timeout = self.header_read_timeout;
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let app = app.clone();
                            async move { dispatch(app, req, remote_addr).await }
                        });

                        let mut builder = ConnBuilder::new(TokioExecutor::new());
                        builder
                            .http1()
                            .timer(TokioTimer::new())
                            .header_read_timeout(header_read_timeout);

                        let conn = builder.serve_connection(io, svc);
                        tokio::pin!(conn);

                        let mut shutting_down = false;
                        loop {
                            tokio::select! {
                                res = conn.as_mut() => {
                                    if let Err(e) = res {
                                        warn!(peer = %remote_addr, "connection error: {e}");
                                    }
                                    break;
                                }
                                changed = draining.changed(), if !shutting_down => {
                                    shutting_down = true;
                                    if changed.is_ok() {
                                        conn.as_mut().graceful_shutdown();
                                    }
                                }
                            }
                        }
                    });
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    reap(joined);
                }
            }
        }

        let _ = draining_tx.send(true);

        let drain_timeout = self.drain_timeout;
        let drained = tokio::time::timeout(drain_timeout, async {
            while let Some(joined) = tasks.join_next().await {
                reap(joined);
            }
        })
        .await;

        if drained.is_err() {
            error!(
                abandoned = tasks.len(),
                timeout_secs = drain_timeout.as_secs(),
                "drain timeout exceeded, abandoning in-flight connections"
            );
            tasks.shutdown().await;
        }

        info!("vigil stopped");
        Ok(())
    }
}

/// Logs connection tasks that died by panicking.
///
/// An HTTP/1 handler panic unwinds to here: the connection is dropped and the
/// server keeps going. HTTP/2 streams run on their own executor tasks, so a
/// panic there only resets that stream and never reaches the `JoinSet`.
fn reap(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!("connection task panicked: {e}");
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: adapts one hyper request to a vigil [`Request`] and runs
/// the composed application.
///
/// The error type is [`Infallible`](std::convert::Infallible): routing and
/// handler failures are already responses by the time they get here.
async fn dispatch(
    app: BoxedHandler,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, _body) = req.into_parts();
    let response = app.call(Request::from_parts(parts, remote_addr)).await;
    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// If a handler cannot be installed, that arm never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => info!("received SIGINT"),
        () = sigterm  => info!("received SIGTERM"),
    }
}
