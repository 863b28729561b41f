//! Prometheus request metrics and the `/metrics` exposition endpoint.

use std::sync::Arc;
use std::time::Instant;

use http::{HeaderValue, Method, StatusCode, header::CONTENT_TYPE};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Request counters and latency histograms, plus the registry that owns them.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    duration: HistogramVec,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests served"),
            &["method", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request handling duration in seconds",
            ),
            &["method"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(Self { registry, requests, duration })
    }

    pub fn observe(&self, method: &Method, status: StatusCode, seconds: f64) {
        let method = method_label(method);
        self.requests
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.duration.with_label_values(&[method]).observe(seconds);
    }

    /// Renders every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(buf)
    }
}

const STANDARD_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// Label value for `method`. Extension methods collapse into `other` so
/// clients cannot mint new series.
fn method_label(method: &Method) -> &str {
    if STANDARD_METHODS.contains(method) { method.as_str() } else { "other" }
}

impl Middleware for HttpMetrics {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let metrics = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method().clone();
            let res = next.run(req).await;
            metrics.observe(&method, res.status_code(), start.elapsed().as_secs_f64());
            res
        })
    }
}

/// `GET /metrics`.
pub async fn exposition(metrics: Arc<HttpMetrics>, _req: Request) -> Response {
    match metrics.encode() {
        Ok(body) => {
            let mut res = Response::status(StatusCode::OK);
            res.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static(prometheus::TEXT_FORMAT),
            );
            res.body = body;
            res
        }
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn routes(router: Router, metrics: Arc<HttpMetrics>) -> Router {
    router.get("/metrics", move |req| exposition(Arc::clone(&metrics), req))
}
