//! Structured per-request logging.
//!
//! Every request that completes produces exactly one `tracing` event at
//! `INFO` with the message `request` and the fields `method`, `path`,
//! `status`, `bytes`, `remote`, `dur_ms`. The event is emitted as soon as the
//! inner handler returns, so records follow completion order.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use http::Method;
use tracing::info;

use super::{Middleware, Next, ResponseCapture};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// What happened to one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestOutcome {
    pub method: Method,
    pub path: String,
    pub status: u16,
    pub bytes: usize,
    pub remote: Option<SocketAddr>,
    pub duration: Duration,
}

impl RequestOutcome {
    /// Writes the outcome to the log sink.
    pub fn emit(&self) {
        let remote = self.remote.map_or_else(|| "-".to_owned(), |addr| addr.to_string());
        let dur_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        info!(
            method = %self.method,
            path = %self.path,
            status = self.status,
            bytes = self.bytes,
            remote = %remote,
            dur_ms,
            "request"
        );
    }
}

/// Times each request and logs its [`RequestOutcome`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let path = req.path().to_owned();
            let remote = req.remote_addr();

            let res = next.run(req).await;

            let mut capture = ResponseCapture::new(Response::empty());
            res.write_to(&mut capture);

            let outcome = RequestOutcome {
                method,
                path,
                status: capture.status().map_or(0, |s| s.as_u16()),
                bytes: capture.bytes_written(),
                remote,
                duration: start.elapsed(),
            };
            outcome.emit();

            capture.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use http::StatusCode;
    use serde_json::Value;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::handler::{self, ErasedHandler};
    use crate::middleware::{BoxedMiddleware, chain};

    /// In-memory log sink for asserting on emitted records.
    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Sink {
        type Writer = Sink;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Sink {
        fn records(&self) -> Vec<Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn logged(handler: crate::handler::BoxedHandler) -> crate::handler::BoxedHandler {
        let stack: Vec<BoxedMiddleware> = vec![Arc::new(RequestLogger)];
        chain(handler, stack)
    }

    #[tokio::test]
    async fn one_record_per_request() {
        let sink = Sink::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = logged(handler::boxed(|_req: Request| async {
            Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .json(br#"{"status":"warming"}"#.to_vec())
        }));
        let peer: SocketAddr = "10.0.0.7:41000".parse().unwrap();
        let res = app.call(Request::get("/readyz").with_remote_addr(peer)).await;

        assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(res.body(), br#"{"status":"warming"}"#);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let fields = &records[0]["fields"];
        assert_eq!(fields["message"], "request");
        assert_eq!(fields["method"], "GET");
        assert_eq!(fields["path"], "/readyz");
        assert_eq!(fields["status"], 503);
        assert_eq!(fields["bytes"], 20);
        assert_eq!(fields["remote"], "10.0.0.7:41000");
        assert!(fields["dur_ms"].is_u64());
    }

    #[tokio::test]
    async fn missing_peer_is_logged_as_dash() {
        let sink = Sink::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(sink.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = logged(handler::boxed(|_req: Request| async { StatusCode::NO_CONTENT }));
        app.call(Request::get("/")).await;

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fields"]["remote"], "-");
        assert_eq!(records[0]["fields"]["status"], 204);
        assert_eq!(records[0]["fields"]["bytes"], 0);
    }

    #[tokio::test]
    async fn response_passes_through_unchanged() {
        let app = logged(handler::boxed(|_req: Request| async {
            Response::builder()
                .status(StatusCode::CREATED)
                .header(http::header::LOCATION, http::HeaderValue::from_static("/x"))
                .text("made")
        }));

        let res = app.call(Request::get("/")).await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("location"), Some("/x"));
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body(), b"made");
    }
}
