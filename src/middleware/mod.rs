//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: security headers, structured request logging,
//! metrics.
//!
//! A middleware receives the request and a [`Next`] handle to the rest of the
//! chain. It may act before calling `next.run(req)`, after it, or both:
//!
//! ```rust
//! use std::sync::Arc;
//! use vigil::middleware::{self, BoxedMiddleware};
//! use vigil::{Request, Response, handler};
//!
//! async fn hello(_req: Request) -> Response { Response::text("hello") }
//!
//! let stack: Vec<BoxedMiddleware> = vec![
//!     Arc::new(middleware::SecurityHeaders),
//!     Arc::new(middleware::RequestLogger),
//! ];
//! let app = middleware::chain(handler::boxed(hello), stack);
//! ```
//!
//! The first entry of the stack is the outermost layer: it sees the request
//! first and the response last.

mod capture;
mod logging;
mod security;

use std::future::Future;
use std::sync::Arc;

pub use capture::ResponseCapture;
pub use logging::{RequestLogger, RequestOutcome};
pub use security::{CONTENT_SECURITY_POLICY, SecurityHeaders};

use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::Response;

/// A cross-cutting wrapper around the rest of the chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the chain below the current middleware.
#[derive(Clone)]
pub struct Next {
    inner: BoxedHandler,
}

impl Next {
    /// Hands the request to the next layer (or the terminal handler).
    pub fn run(self, req: Request) -> BoxFuture {
        self.inner.call(req)
    }
}

/// Wraps `handler` in `middleware`, first entry outermost.
///
/// `chain(t, [a, b])` behaves exactly like `chain(chain(t, [b]), [a])`.
pub fn chain(
    handler: BoxedHandler,
    middleware: impl IntoIterator<Item = BoxedMiddleware>,
) -> BoxedHandler {
    let stack: Vec<BoxedMiddleware> = middleware.into_iter().collect();
    stack.into_iter().rev().fold(handler, |next, middleware| {
        Arc::new(Layer { middleware, next })
    })
}

/// One middleware bound to the handler it wraps.
struct Layer {
    middleware: BoxedMiddleware,
    next: BoxedHandler,
}

impl ErasedHandler for Layer {
    fn call(&self, req: Request) -> BoxFuture {
        let next = Next { inner: Arc::clone(&self.next) };
        self.middleware.handle(req, next)
    }
}

/// Builds a middleware from an async closure.
///
/// ```rust
/// use vigil::middleware::{self, Next};
/// use vigil::Request;
///
/// let noop = middleware::from_fn(|req: Request, next: Next| next.run(req));
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    FromFn(f)
}

/// Middleware returned by [`from_fn`].
pub struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        Box::pin((self.0)(req, next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{HeaderValue, StatusCode};

    use super::*;
    use crate::handler;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracer(name: &'static str, trace: &Trace) -> BoxedMiddleware {
        let trace = Arc::clone(trace);
        Arc::new(from_fn(move |req: Request, next: Next| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push(format!("{name}:in"));
                let res = next.run(req).await;
                trace.lock().unwrap().push(format!("{name}:out"));
                res
            }
        }))
    }

    fn terminal(trace: &Trace) -> BoxedHandler {
        let trace = Arc::clone(trace);
        handler::boxed(move |_req: Request| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push("handler".to_owned());
                Response::text("done")
            }
        })
    }

    #[tokio::test]
    async fn first_middleware_is_outermost() {
        let trace = Trace::default();
        let app = chain(terminal(&trace), [tracer("a", &trace), tracer("b", &trace)]);

        let res = app.call(Request::get("/")).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(
            *trace.lock().unwrap(),
            ["a:in", "b:in", "handler", "b:out", "a:out"],
        );
    }

    #[tokio::test]
    async fn flat_chain_matches_manual_nesting() {
        let flat = Trace::default();
        let app = chain(terminal(&flat), [tracer("a", &flat), tracer("b", &flat)]);
        app.call(Request::get("/")).await;

        let nested = Trace::default();
        let inner = chain(terminal(&nested), [tracer("b", &nested)]);
        let app = chain(inner, [tracer("a", &nested)]);
        app.call(Request::get("/")).await;

        assert_eq!(*flat.lock().unwrap(), *nested.lock().unwrap());
    }

    #[tokio::test]
    async fn empty_chain_is_the_handler() {
        let trace = Trace::default();
        let app = chain(terminal(&trace), Vec::new());
        let res = app.call(Request::get("/")).await;

        assert_eq!(res.body(), b"done");
        assert_eq!(*trace.lock().unwrap(), ["handler"]);
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let trace = Trace::default();
        let deny: BoxedMiddleware = Arc::new(from_fn(|_req: Request, _next: Next| async {
            Response::status(StatusCode::FORBIDDEN)
        }));
        let app = chain(terminal(&trace), [deny]);

        let res = app.call(Request::get("/")).await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert!(trace.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_layers_see_earlier_request_changes() {
        let stamp: BoxedMiddleware = Arc::new(from_fn(|req: Request, next: Next| {
            let req = req.with_header(
                http::header::HeaderName::from_static("x-stamp"),
                HeaderValue::from_static("1"),
            );
            next.run(req)
        }));
        let app = chain(
            handler::boxed(|req: Request| async move {
                Response::text(req.header("x-stamp").unwrap_or("missing").to_owned())
            }),
            [stamp],
        );

        let res = app.call(Request::get("/")).await;
        assert_eq!(res.body(), b"1");
    }

    async fn explode(_req: Request) -> Response {
        panic!("handler blew up")
    }

    #[tokio::test]
    #[should_panic(expected = "handler blew up")]
    async fn handler_panics_reach_the_caller() {
        let stack: Vec<BoxedMiddleware> = vec![Arc::new(SecurityHeaders), Arc::new(RequestLogger)];
        let app = chain(handler::boxed(explode), stack);
        app.call(Request::get("/")).await;
    }
}
